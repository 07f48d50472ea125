use crate::cmd_log::format_entry_line;
use crate::session::{resolve_or_latest, Target};
use skein_log::ContextItem;

/// `skein branch [target] [--json]`
pub fn branch(target: &Target, at: Option<&str>, json: bool) -> anyhow::Result<()> {
    let log = target.open()?;
    let Some(id) = resolve_or_latest(&log, at)? else {
        println!("(empty log)");
        return Ok(());
    };
    for entry in log.get_branch(&id) {
        if json {
            println!("{}", serde_json::to_string(entry)?);
        } else {
            println!("{}", format_entry_line(entry));
        }
    }
    Ok(())
}

/// `skein messages [target] [--compacted] [--json]`
pub fn messages(
    target: &Target,
    at: Option<&str>,
    compacted: bool,
    json: bool,
) -> anyhow::Result<()> {
    let log = target.open()?;
    let id = resolve_or_latest(&log, at)?;

    if compacted {
        let items = log.compacted_context(id.as_deref());
        if json {
            let rendered: Vec<serde_json::Value> = items.iter().map(context_item_json).collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        } else {
            for item in &items {
                println!("{}", context_item_line(item));
            }
        }
        return Ok(());
    }

    let exported = log.export_messages(id.as_deref());
    if json {
        println!("{}", serde_json::to_string_pretty(&exported)?);
    } else {
        for m in &exported {
            println!("{}: {}", m.role, m.content);
        }
    }
    Ok(())
}

fn context_item_line(item: &ContextItem<'_>) -> String {
    match item {
        ContextItem::Summary { compaction, .. } => format!("[summary] {}", compaction.summary),
        ContextItem::Message { message, .. } => format!("{}: {}", message.role, message.content),
    }
}

/// Summaries are handed to the model as system messages.
fn context_item_json(item: &ContextItem<'_>) -> serde_json::Value {
    match item {
        ContextItem::Summary { compaction, .. } => serde_json::json!({
            "role": "system",
            "content": compaction.summary,
            "compaction": true,
        }),
        ContextItem::Message { message, .. } => serde_json::json!({
            "role": message.role,
            "content": message.content,
        }),
    }
}
