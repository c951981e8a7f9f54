//! Synthetic news templates.

/// A headline with its base impact before jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewsTemplate {
    pub title: &'static str,
    pub content: &'static str,
    pub impact: f64,
}

const fn t(title: &'static str, content: &'static str, impact: f64) -> NewsTemplate {
    NewsTemplate {
        title,
        content,
        impact,
    }
}

/// Company-specific headlines; the title is prefixed with the company name.
pub static STOCK_TEMPLATES: [NewsTemplate; 8] = [
    t(
        "Quarterly Earnings Beat Expectations",
        "Company reports better than expected quarterly earnings, boosting investor confidence.",
        0.05,
    ),
    t(
        "New Product Launch Success",
        "The latest product launch has exceeded sales projections, driving market enthusiasm.",
        0.03,
    ),
    t(
        "Regulatory Concerns Emerge",
        "Recent regulatory developments raise concerns about future operations.",
        -0.04,
    ),
    t(
        "Market Volatility Increases",
        "Global market conditions are causing increased volatility across sectors.",
        -0.02,
    ),
    t(
        "Strategic Partnership Announced",
        "New partnership deal opens up significant growth opportunities.",
        0.04,
    ),
    t(
        "Supply Chain Disruptions",
        "Ongoing supply chain issues are impacting production and delivery timelines.",
        -0.03,
    ),
    t(
        "Strong Consumer Demand",
        "Consumer spending data shows robust demand for products and services.",
        0.02,
    ),
    t(
        "Economic Indicators Improve",
        "Latest economic data suggests improving conditions for businesses.",
        0.03,
    ),
];

/// Market-wide headlines; no affected stocks.
pub static MARKET_TEMPLATES: [NewsTemplate; 4] = [
    t(
        "Federal Reserve Announces Policy Changes",
        "The Federal Reserve has made significant announcements regarding monetary policy.",
        0.02,
    ),
    t(
        "Global Trade Tensions Ease",
        "Recent diplomatic developments suggest easing of international trade tensions.",
        0.03,
    ),
    t(
        "Economic Data Surprises Markets",
        "Latest economic indicators have surprised analysts with stronger than expected results.",
        0.025,
    ),
    t(
        "Geopolitical Events Impact Markets",
        "Recent geopolitical developments are causing uncertainty in global markets.",
        -0.02,
    ),
];
