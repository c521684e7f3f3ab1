//! Markdown report generation.
//!
//! This module renders the partner dashboard (metric tiles, assessment
//! panels, and the copy-ready outreach message) as Markdown or JSON.

use crate::models::{MetricsSummary, PartnerAssessment, Report, ReportMetadata, SamplePost};
use anyhow::Result;

const TABLE_CAPTION_CHARS: usize = 80;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# PartnerMiner Report: @{}\n\n",
        report.metadata.username
    ));

    output.push_str(&generate_metadata_section(&report.metadata));

    output.push_str(&generate_health_section(
        &report.metrics,
        report.assessment.as_ref(),
    ));

    if let Some(ref assessment) = report.assessment {
        output.push_str(&generate_authenticity_section(assessment));
        output.push_str(&generate_power_section(assessment));
        output.push_str(&generate_proposal_section(assessment));
    }

    output.push_str(&generate_sample_section(&report.metrics.sample_posts));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Account:** [@{0}](https://www.instagram.com/{0}/)\n",
        metadata.username
    ));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Source:** {}\n", metadata.source));
    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push_str(&format!("- **Posts Fetched:** {}\n", metadata.posts_fetched));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the basic-health section: bio, contact point, and metric tiles.
fn generate_health_section(
    metrics: &MetricsSummary,
    assessment: Option<&PartnerAssessment>,
) -> String {
    let mut section = String::new();

    section.push_str("## 1. Basic Health (last 30 days)\n\n");

    if metrics.biography.trim().is_empty() {
        section.push_str("> *No biography*\n\n");
    } else {
        section.push_str(&blockquote(&format!("**Bio:**\n{}", metrics.biography)));
        section.push('\n');
    }

    if !metrics.external_url.is_empty() {
        section.push_str(&format!("**Link:** {}\n\n", metrics.external_url));
    }

    if let Some(assessment) = assessment {
        section.push_str(&format!("**📞 Contact point:** {}\n\n", assessment.contact));
    }

    section.push_str("| Followers | Posts (30d) | 🎬 Avg Reel Views | Avg Likes | Avg Comments |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        format_thousands(metrics.follower_count),
        metrics.recent_post_count,
        format_thousands(metrics.average_video_views),
        format_thousands(metrics.average_likes),
        format_thousands(metrics.average_comments),
    ));

    section
}

/// Generate the group-buy authenticity section.
fn generate_authenticity_section(assessment: &PartnerAssessment) -> String {
    let auth = &assessment.authenticity;
    let mut section = String::new();

    section.push_str("## 🚨 2. Authenticity Check\n\n");
    section.push_str("| 🛒 Group buys / month | 📈 Build-up per campaign |\n");
    section.push_str("|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} |\n\n",
        table_cell(&auth.group_buy_count),
        table_cell(&auth.buildup_index)
    ));

    section.push_str("**📋 Sales (last month)**\n\n");
    section.push_str(&blockquote(&auth.recent_sales_list));
    section.push('\n');

    section
}

/// Generate the buying-power section.
fn generate_power_section(assessment: &PartnerAssessment) -> String {
    let power = &assessment.power;
    let mut section = String::new();

    section.push_str("## 🔥 3. Buying Power\n\n");
    section.push_str(&format!("- **💎 True fans:** {}\n", power.true_fans));
    section.push_str(&format!("- **🗣️ Buying signals:** {}\n", power.buying_signal));
    section.push_str(&format!("- **🎧 CS responsiveness:** {}\n", power.cs_signal));
    section.push('\n');

    section
}

/// Generate the strategy and outreach message section.
fn generate_proposal_section(assessment: &PartnerAssessment) -> String {
    let mut section = String::new();

    section.push_str("## 🎯 4. Strategy & Outreach Message\n\n");
    section.push_str(&format!(
        "> 💡 **Recommended strategy:** {}\n\n",
        assessment.strategy
    ));

    section.push_str("**📨 Outreach message** (copy as-is)\n\n");
    let fence = if assessment.message.contains("```") {
        "````"
    } else {
        "```"
    };
    section.push_str(&format!("{}text\n", fence));
    section.push_str(assessment.message.trim_end());
    section.push_str(&format!("\n{}\n\n", fence));

    section
}

/// Generate the table of posts the averages were computed over.
fn generate_sample_section(posts: &[SamplePost]) -> String {
    let mut section = String::new();

    section.push_str("## Sample Posts\n\n");

    if posts.is_empty() {
        section.push_str("No posts were available for this profile.\n\n");
        return section;
    }

    section.push_str("| # | Type | Likes | Comments | Caption |\n");
    section.push_str("|:---:|:---|---:|---:|:---|\n");

    for (i, post) in posts.iter().enumerate() {
        let mut caption: String = post.caption.chars().take(TABLE_CAPTION_CHARS).collect();
        if post.caption.chars().count() > TABLE_CAPTION_CHARS {
            caption.push('…');
        }
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            post.kind,
            format_thousands(post.like_count),
            format_thousands(post.comment_count),
            table_cell(&caption)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by PartnerMiner*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Format an integer with comma thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

fn blockquote(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        out.push_str("> ");
        out.push_str(line);
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str(">\n");
    }
    out
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
