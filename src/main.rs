//! rexrepl demo shell.
//!
//! Usage: `rexrepl [config.toml]`. Without a config file the shell starts
//! with default options and no work item servers.

use async_trait::async_trait;
use rexrepl::workitems::WorkItemFields;
use rexrepl::{
    Command, CommandContext, Config, HandlerResult, Handler, Interpreter, MatchOptions, palette,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const HEADER: &str = "\
###################
#     rexrepl     #
###################
Type `help` for commands, `exit` to quit.";

/// Lists the work item servers handlers can reach.
struct ServersCommand;

#[async_trait]
impl Command for ServersCommand {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult {
        let term = ctx.terminal();
        let mut any = false;
        for name in ctx.work_items().server_names() {
            term.write_line(name, Some(palette::INFO))?;
            any = true;
        }
        if !any {
            term.write_line("no servers configured", Some(palette::MUTED))?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the prompt on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mut repl = match std::env::args().nth(1) {
        Some(path) => {
            let config = Config::load(&path).map_err(|e| {
                error!(path = %path, error = %e, "Failed to load config");
                e
            })?;
            info!(path = %path, servers = config.servers.len(), "Loaded config");
            Interpreter::from_config(config)?
        }
        None => demo_interpreter(),
    };
    repl.configure(|o| {
        if o.header_text.is_empty() {
            o.header_text = HEADER.to_string();
        }
    });

    register_commands(&mut repl)?;
    repl.run().await?;
    Ok(())
}

/// Demo defaults, used only when no config file is given.
fn demo_interpreter() -> Interpreter {
    let mut repl = Interpreter::new();
    repl.configure(|o| o.line_break_between_commands = true);
    repl
}

fn register_commands(repl: &mut Interpreter) -> anyhow::Result<()> {
    repl.add_command_with(
        "^help$",
        MatchOptions::case_insensitive(),
        Handler::sync(|ctx| {
            let term = ctx.terminal();
            for line in [
                "echo <text>                     print text",
                "sum <n> [n...]                  add integers",
                "time                            current local time",
                "servers                         list work item servers",
                "wi <server> <id>                show a work item",
                "close <server> <id>             close a work item",
                "sprint <server> <project> [team] current iteration",
                "exit                            quit",
            ] {
                term.write_line(line, None)?;
            }
            Ok(())
        }),
    )?
    .add_command(
        "^echo (.+)$",
        Handler::sync(|ctx| {
            ctx.terminal()
                .write_line(ctx.matched().group(1).unwrap_or_default(), None)?;
            Ok(())
        }),
    )?
    .add_command(
        r"^sum(?: -?\d+)+$",
        Handler::sync(|ctx| {
            let mut total: i64 = 0;
            for arg in &ctx.args()[1..] {
                total = total
                    .checked_add(arg.parse::<i64>()?)
                    .ok_or_else(|| anyhow::anyhow!("sum overflows"))?;
            }
            ctx.terminal().write_line(total, Some(palette::SUCCESS))?;
            Ok(())
        }),
    )?
    .add_command_with(
        "^time$",
        MatchOptions::case_insensitive(),
        Handler::sync(|ctx| {
            let now = chrono::Local::now();
            ctx.terminal()
                .write_line(now.format("%Y-%m-%d %H:%M:%S"), None)?;
            Ok(())
        }),
    )?
    .add_command("^servers$", Handler::command(ServersCommand))?
    .add_command(
        r"^wi (?P<server>\S+) (?P<id>\d+)$",
        Handler::suspending(|ctx| async move {
            let server = ctx.matched().name("server").unwrap_or_default();
            let id: i64 = ctx.matched().name("id").unwrap_or_default().parse()?;
            let item = ctx.work_items().get_work_item(server, id, None).await?;

            let term = ctx.terminal();
            term.write_line(
                format_args!("#{} {}", item.id, item.title().unwrap_or("(untitled)")),
                Some(palette::INFO),
            )?;
            term.write_line(
                format_args!("state: {}", item.state().unwrap_or("unknown")),
                Some(palette::MUTED),
            )?;
            Ok(())
        }),
    )?
    .add_command(
        r"^close (?P<server>\S+) (?P<id>\d+)$",
        Handler::suspending(|ctx| async move {
            let server = ctx.matched().name("server").unwrap_or_default();
            let id: i64 = ctx.matched().name("id").unwrap_or_default().parse()?;

            let term = ctx.terminal();
            if !term
                .confirm(format!("Close work item #{id}?"), Some(palette::WARNING))
                .await?
            {
                term.write_line("cancelled", Some(palette::MUTED))?;
                return Ok(());
            }

            let fields = WorkItemFields {
                state: Some("Closed".to_string()),
                ..Default::default()
            };
            let item = ctx.work_items().update_work_item(server, id, &fields).await?;
            term.write_line(format_args!("#{} closed", item.id), Some(palette::SUCCESS))?;
            Ok(())
        }),
    )?
    .add_command(
        r"^sprint (?P<server>\S+) (?P<project>\S+)(?: (?P<team>.+))?$",
        Handler::suspending(|ctx| async move {
            let matched = ctx.matched();
            let server = matched.name("server").unwrap_or_default();
            let project = matched.name("project").unwrap_or_default();
            let iterations = ctx
                .work_items()
                .get_current_team_iterations(server, project, matched.name("team"))
                .await?;

            let term = ctx.terminal();
            if iterations.is_empty() {
                term.write_line("no current iteration", Some(palette::MUTED))?;
            }
            for iteration in iterations {
                let attrs = &iteration.attributes;
                let span = match (attrs.start_date, attrs.finish_date) {
                    (Some(start), Some(finish)) => {
                        format!("{} -> {}", start.format("%Y-%m-%d"), finish.format("%Y-%m-%d"))
                    }
                    _ => "no dates".to_string(),
                };
                term.write_line(format_args!("{} ({span})", iteration.name), Some(palette::INFO))?;
            }
            Ok(())
        }),
    )?;

    Ok(())
}
