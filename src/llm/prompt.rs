//! Prompt construction for the partner assessment.

use crate::models::MetricsSummary;

/// Build the single-shot prompt sent to the model.
///
/// The knowledge base is the user's product / proposal guideline document
/// and is embedded verbatim.
pub fn build_prompt(summary: &MetricsSummary, knowledge_base: &str) -> String {
    let posts_json =
        serde_json::to_string(&summary.sample_posts).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::new();

    prompt.push_str(
        "You are a seasoned e-commerce partnerships lead. Analyze the data below and answer in JSON.\n\n",
    );

    prompt.push_str("[Product and proposal guidelines]\n");
    prompt.push_str(knowledge_base.trim());
    prompt.push_str("\n\n");

    prompt.push_str("[Influencer profile]\n");
    prompt.push_str(&format!("- Bio: {}\n", summary.biography));
    prompt.push_str(&format!("- Link: {}\n", summary.external_url));
    prompt.push_str(&format!("- Followers: {}\n", summary.follower_count));
    prompt.push_str(&format!(
        "- Posts in sample: {} (avg likes {}, avg comments {}, avg reel views {})\n",
        summary.recent_post_count,
        summary.average_likes,
        summary.average_comments,
        summary.average_video_views
    ));
    prompt.push_str(&format!("[Recent posts] {}\n\n", posts_json));

    prompt.push_str("[Analysis requests]\n");
    prompt.push_str(&format!(
        "1. Contact point: scan the bio and link for a KakaoTalk open chat or a personal email. \
Ignore bare linktr.ee addresses and the Business Contact button.\n\
   - Found: \"[KakaoTalk] open chat link\" or \"[Email] address\"\n\
   - Not found: \"No contact point (candidate link: {})\"\n",
        summary.external_url
    ));
    prompt.push_str(
        "2. Group-buy authenticity:\n\
   - group_buy_count: estimated group-buy campaigns in the last 30 days (e.g. \"4 (healthy)\", \"10 (overloaded)\")\n\
   - buildup_index: teaser / open / closing posts per campaign (e.g. \"3 posts per campaign (strong)\")\n\
   - recent_sales_list: exact product names sold in the last month, or \"No group buys in the last month\"\n",
    );
    prompt.push_str(
        "3. Buying power and fandom:\n\
   - true_fans: engaged-fan ratio with the absolute head count (e.g. \"12.5% (34 people)\")\n\
   - buying_signal: count and tone of purchase-intent comments (\"how much?\", \"ordered!\")\n\
   - cs_signal: estimated reply speed and friendliness of the seller\n",
    );
    prompt.push_str(
        "4. Strategy and tailored proposal: absorb the guidelines above completely and write a \
business proposal with these parts:\n\
   - [Pain points]: empathize using what the feed shows (falling organic reach, fatigue from ill-fitting group buys)\n\
   - [Product highlights]: price and strengths as '-' bullet points\n\
   - [Proof]: reference results, numbers first\n\
   - Make it skimmable (line breaks, symbols) so it can be pasted without edits.\n\n",
    );

    prompt.push_str(
        "[Hard rule] Never put monetary terms from the guidelines into `message`: no cost sharing, \
revenue split ratios, or ad spend burden. Emphasize only positive support such as full brand \
backing and Meta partnership ad support, and aim for a meeting or call.\n\n",
    );

    prompt.push_str("[Output format]\n");
    prompt.push_str(OUTPUT_SCHEMA);

    prompt
}

const OUTPUT_SCHEMA: &str = r#"{
    "contact": "...",
    "authenticity": {
        "group_buy_count": "...",
        "buildup_index": "...",
        "recent_sales_list": "..."
    },
    "power": {
        "true_fans": "...",
        "buying_signal": "...",
        "cs_signal": "..."
    },
    "strategy": "...",
    "message": "..."
}
"#;
