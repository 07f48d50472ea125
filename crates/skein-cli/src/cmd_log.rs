use crate::session::Target;
use skein_core::{Entry, EntryKind};

/// `skein log [--type] [--limit] [--json]`
pub fn execute(
    target: &Target,
    entry_type: Option<&str>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let log = target.open()?;
    let mut matched: Vec<&Entry> = log
        .entries()
        .iter()
        .rev() // newest first
        .filter(|e| match entry_type {
            Some(t) => e.type_name() == t,
            None => true,
        })
        .collect();

    if limit > 0 {
        matched.truncate(limit);
    }

    if matched.is_empty() {
        println!("No entries match the filter.");
        return Ok(());
    }

    if json {
        for e in &matched {
            println!("{}", serde_json::to_string(e)?);
        }
    } else {
        for e in &matched {
            println!("{}", format_entry_line(e));
        }
        println!("\n({} entries shown)", matched.len());
    }
    Ok(())
}

/// `[2026-02-14 03:42] message  1b4e28ba...  user: "text"`
pub fn format_entry_line(entry: &Entry) -> String {
    // "2026-02-14T03:42:00Z" -> "2026-02-14 03:42"
    let ts_short = match (entry.timestamp.get(..10), entry.timestamp.get(11..16)) {
        (Some(date), Some(time)) => format!("{date} {time}"),
        _ => entry.timestamp.clone(),
    };
    format!(
        "[{ts_short}] {:<21} {}  {}",
        entry.type_name(),
        short_id(&entry.id),
        format_entry_detail(entry)
    )
}

pub fn short_id(id: &str) -> String {
    if id.chars().count() > 8 {
        format!("{}...", id.chars().take(8).collect::<String>())
    } else {
        id.to_string()
    }
}

pub fn format_entry_detail(entry: &Entry) -> String {
    match &entry.kind {
        EntryKind::Message(m) => {
            let mut detail = format!("{}: \"{}\"", m.role, truncate(&m.content, 60));
            if !m.tool_calls.is_empty() {
                detail.push_str(&format!(" [{} tool calls]", m.tool_calls.len()));
            }
            detail
        }
        EntryKind::Compaction(c) => format!(
            "\"{}\" (supersedes {} entries, {} -> {} tokens)",
            truncate(&c.summary, 60),
            c.removed_entries.len(),
            c.tokens_before,
            c.tokens_after
        ),
        EntryKind::BranchSummary(b) => format!("{} \"{}\"", b.branch_id, truncate(&b.summary, 60)),
        EntryKind::ModelChange(m) => {
            format!("{} -> {}", m.old_model.as_deref().unwrap_or("(none)"), m.new_model)
        }
        EntryKind::ThinkingLevelChange(t) => {
            format!("{} -> {}", t.old_level.as_deref().unwrap_or("(none)"), t.new_level)
        }
        EntryKind::Custom(c) => c.custom_type.clone(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    let line = s.lines().next().unwrap_or("");
    if line.chars().count() > max || line.len() < s.trim_end().len() {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
