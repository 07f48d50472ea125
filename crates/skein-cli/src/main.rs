mod cmd_append;
mod cmd_branch;
mod cmd_compact;
mod cmd_config;
mod cmd_fork;
mod cmd_label;
mod cmd_log;
mod cmd_tree;
mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skein", version, about = "Branching session log for conversational agents")]
struct Cli {
    /// Session log file (JSONL)
    #[arg(long, global = true, conflicts_with = "session")]
    log: Option<PathBuf>,
    /// Session id; the log lives under the per-user store
    #[arg(long, global = true)]
    session: Option<String>,
    /// JSON config file (write_policy, fsync, lock_appends)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append a message
    Append {
        /// Message text
        content: String,
        /// Role: user, assistant, system, or tool_result
        #[arg(long, default_value = "user")]
        role: String,
        /// Parent entry id or label (defaults to the latest entry)
        #[arg(long, conflicts_with = "root")]
        parent: Option<String>,
        /// Start a new root instead of continuing the latest entry
        #[arg(long)]
        root: bool,
    },
    /// Record a model change
    Model {
        /// Model now in use
        new_model: String,
        /// Model used before
        #[arg(long)]
        old: Option<String>,
        /// Parent entry id or label (defaults to the latest entry)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Record a thinking-level change
    Thinking {
        /// Thinking level now in use
        new_level: String,
        /// Level used before
        #[arg(long)]
        old: Option<String>,
        /// Parent entry id or label (defaults to the latest entry)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Create a checkpoint continuing from an entry
    Fork {
        /// Entry id or label to fork from
        from: String,
        /// Label to bind to the new checkpoint
        #[arg(long)]
        label: Option<String>,
    },
    /// Record a compaction summary
    Compact {
        /// Summary replacing the removed entries
        summary: String,
        /// Entry ids the summary supersedes (repeatable)
        #[arg(long = "remove")]
        removed: Vec<String>,
        /// Token count before compaction
        #[arg(long, default_value_t = 0)]
        tokens_before: u64,
        /// Token count after compaction
        #[arg(long, default_value_t = 0)]
        tokens_after: u64,
        /// Parent entry id or label (defaults to the latest entry)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Label operations (set, get, list, rm)
    Label {
        #[command(subcommand)]
        cmd: cmd_label::LabelCmd,
    },
    /// Show every entry on the branch ending at an entry
    Branch {
        /// Entry id or label (defaults to the latest entry)
        target: Option<String>,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show the messages on a branch
    Messages {
        /// Entry id or label (defaults to the latest entry)
        target: Option<String>,
        /// Apply compactions recorded on the branch
        #[arg(long)]
        compacted: bool,
        /// Output as a JSON array of {role, content}
        #[arg(long)]
        json: bool,
    },
    /// Show the whole conversation tree
    Tree {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries, newest first
    Log {
        /// Filter by entry type (message, compaction, branch_summary, ...)
        #[arg(long = "type")]
        entry_type: Option<String>,
        /// Maximum number of entries to show (0 = unlimited)
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SKEIN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let target = session::Target {
        log: cli.log,
        session: cli.session,
        config: cli.config,
    };

    match cli.cmd {
        Command::Append {
            content,
            role,
            parent,
            root,
        } => cmd_append::message(&target, &content, &role, parent.as_deref(), root),
        Command::Model {
            new_model,
            old,
            parent,
        } => cmd_append::model(&target, &new_model, old.as_deref(), parent.as_deref()),
        Command::Thinking {
            new_level,
            old,
            parent,
        } => cmd_append::thinking(&target, &new_level, old.as_deref(), parent.as_deref()),
        Command::Fork { from, label } => cmd_fork::execute(&target, &from, label.as_deref()),
        Command::Compact {
            summary,
            removed,
            tokens_before,
            tokens_after,
            parent,
        } => cmd_compact::execute(cmd_compact::CompactParams {
            target: &target,
            summary: &summary,
            removed: &removed,
            tokens_before,
            tokens_after,
            parent: parent.as_deref(),
        }),
        Command::Label { cmd } => cmd_label::run(cmd, &target),
        Command::Branch { target: at, json } => cmd_branch::branch(&target, at.as_deref(), json),
        Command::Messages {
            target: at,
            compacted,
            json,
        } => cmd_branch::messages(&target, at.as_deref(), compacted, json),
        Command::Tree { json } => cmd_tree::execute(&target, json),
        Command::Log {
            entry_type,
            limit,
            json,
        } => cmd_log::execute(&target, entry_type.as_deref(), limit, json),
        Command::Config => cmd_config::execute(&target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_log_after_subcommand() {
        let cli = Cli::try_parse_from(["skein", "append", "Hi", "--log", "s.jsonl"]).unwrap();
        assert_eq!(cli.log, Some(PathBuf::from("s.jsonl")));
        match cli.cmd {
            Command::Append {
                content,
                role,
                parent,
                root,
            } => {
                assert_eq!(content, "Hi");
                assert_eq!(role, "user");
                assert!(parent.is_none());
                assert!(!root);
            }
            _ => panic!("expected append"),
        }
    }

    #[test]
    fn log_and_session_conflict() {
        let res = Cli::try_parse_from(["skein", "--log", "a.jsonl", "--session", "s", "tree"]);
        assert!(res.is_err());
    }

    #[test]
    fn parent_and_root_conflict() {
        let res = Cli::try_parse_from(["skein", "append", "x", "--parent", "p", "--root"]);
        assert!(res.is_err());
    }

    #[test]
    fn compact_collects_repeated_removes() {
        let cli = Cli::try_parse_from([
            "skein",
            "--session",
            "s1",
            "compact",
            "summary",
            "--remove",
            "a",
            "--remove",
            "b",
            "--tokens-before",
            "900",
        ])
        .unwrap();
        assert_eq!(cli.session.as_deref(), Some("s1"));
        match cli.cmd {
            Command::Compact {
                removed,
                tokens_before,
                tokens_after,
                ..
            } => {
                assert_eq!(removed, vec!["a", "b"]);
                assert_eq!(tokens_before, 900);
                assert_eq!(tokens_after, 0);
            }
            _ => panic!("expected compact"),
        }
    }

    #[test]
    fn label_subcommands_parse() {
        let cli = Cli::try_parse_from(["skein", "label", "set", "c1", "e1"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Label {
                cmd: cmd_label::LabelCmd::Set { .. }
            }
        ));
        let cli = Cli::try_parse_from(["skein", "label", "rm", "c1"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Label {
                cmd: cmd_label::LabelCmd::Rm { .. }
            }
        ));
    }

    #[test]
    fn log_filter_flags_parse() {
        let cli = Cli::try_parse_from(["skein", "log", "--type", "message", "--limit", "0", "--json"])
            .unwrap();
        match cli.cmd {
            Command::Log {
                entry_type,
                limit,
                json,
            } => {
                assert_eq!(entry_type.as_deref(), Some("message"));
                assert_eq!(limit, 0);
                assert!(json);
            }
            _ => panic!("expected log"),
        }
    }
}
