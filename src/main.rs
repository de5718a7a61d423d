//! Purpose: `cartlite` CLI entry point and command definitions.
//! Role: Binary crate root; parses args, runs commands, emits JSON or tables on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Sync failures are surfaced as notifications, never as process errors.
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};

mod command_dispatch;
mod serve;

use cartlite::api::{
    CartState, Error, ErrorKind, Notification, Product, RemoteClient, Storefront, demo_products,
    find_product, to_exit_code,
};

const DEFAULT_REMOTE: &str = "http://127.0.0.1:9900";
const DEFAULT_BIND: &str = "127.0.0.1:9900";
const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome { exit_code });
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run with --help for usage."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command, cli.remote)
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.render()
        .to_string()
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

#[derive(Parser)]
#[command(
    name = "cartlite",
    version,
    about = "Storefront cart demo with remote document sync",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"The cart lives in memory for one command and syncs to a remote JSON
document on every change. The remote stores the whole document; there is
no partial update.

Mental model:
  - `shop` lists products (the storefront)
  - `add` / `remove` change the cart and send it
  - `serve` hosts the cart document endpoint
"#,
    after_help = r#"EXAMPLES
  $ cartlite serve                        # Terminal 1: host the document
  $ cartlite shop                         # Terminal 2: browse products
  $ cartlite add p1
  $ cartlite show
  $ cartlite remove p1

LEARN MORE
  $ cartlite <command> --help"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_REMOTE,
        help = "Base URL of the cart document endpoint",
        value_hint = ValueHint::Url
    )]
    remote: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "List the products in the shop",
        after_help = r#"EXAMPLES
  $ cartlite shop
  $ cartlite shop --json"#
    )]
    Shop {
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        about = "Fetch the cart from the remote and print it",
        long_about = r#"Fetch the cart document from the remote endpoint and print it.

A failed fetch prints an error notification and an empty cart; it does not
fail the command."#,
        after_help = r#"EXAMPLES
  $ cartlite show
  $ cartlite show --json"#
    )]
    Show {
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Add one unit of a product to the cart",
        long_about = r#"Fetch the cart, add one unit of the product, and send the updated
document to the remote endpoint."#,
        after_help = r#"EXAMPLES
  $ cartlite add p1
  $ cartlite add p1 --json

NOTES
  - A failed send is reported as a notification, not a command failure."#
    )]
    Add {
        #[arg(help = "Product id (see `cartlite shop`)")]
        id: String,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Remove one unit of a product from the cart",
        long_about = r#"Fetch the cart, remove one unit of the item, and send the updated
document to the remote endpoint. Removing an id that is not in the cart is
an error."#,
        after_help = r#"EXAMPLES
  $ cartlite remove p1
  $ cartlite remove p1 --json"#
    )]
    Remove {
        #[arg(help = "Item id to remove")]
        id: String,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        about = "Interactive storefront session",
        long_about = r#"Run an interactive storefront loop on stdin.

Commands: `shop`, `cart` (toggle the cart panel), `add <id>`,
`remove <id>`, `quit`. The cart is fetched once at startup and synced on
every change; notifications are printed as they change."#,
        after_help = r#"EXAMPLES
  $ cartlite browse
  shop
  add p1
  cart
  quit"#
    )]
    Browse,
    #[command(
        about = "Serve the cart document endpoint over HTTP (loopback default)",
        after_help = r#"EXAMPLES
  $ cartlite serve
  $ cartlite serve --bind 127.0.0.1:9901
  $ cartlite serve --store ./cart.json
  $ cartlite serve --cors-origin http://localhost:3000

NOTES
  - Loopback is the default; non-loopback binds require --allow-non-loopback
  - Without --store the document lives in memory and dies with the process
  - Use repeatable --cors-origin to allow browser clients from specific origins"#
    )]
    Serve {
        #[arg(long, default_value = DEFAULT_BIND, help = "Bind address")]
        bind: String,
        #[arg(
            long,
            value_name = "PATH",
            help = "Persist the document to this JSON file",
            value_hint = ValueHint::FilePath
        )]
        store: Option<PathBuf>,
        #[arg(long, help = "Allow non-loopback binds")]
        allow_non_loopback: bool,
        #[arg(
            long = "cors-origin",
            value_name = "ORIGIN",
            help = "Allow browser requests from this origin (repeatable, explicit list)"
        )]
        cors_origin: Vec<String>,
        #[arg(
            long,
            default_value_t = DEFAULT_MAX_BODY_BYTES,
            help = "Max request body size in bytes"
        )]
        max_body_bytes: u64,
    },
    #[command(about = "Print version info as JSON")]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ cartlite completion bash > ~/.local/share/bash-completion/completions/cartlite
  $ cartlite completion zsh > ~/.zfunc/_cartlite"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn parse_bind(bind: &str) -> Result<SocketAddr, Error> {
    bind.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid bind address")
            .with_hint("Use a host:port value like 127.0.0.1:9900.")
    })
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_message(err));
        if let Some(hint) = err.hint() {
            eprintln!("  hint: {hint}");
        }
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    let mut message = err.message().unwrap_or("error").to_string();
    if let Some(item) = err.item() {
        message.push_str(&format!(" (item: {item})"));
    }
    if let Some(status) = err.status() {
        message.push_str(&format!(" (status: {status})"));
    }
    message
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("error")),
    );
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(item) = err.item() {
        inner.insert("item".to_string(), json!(item));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn emit_notification(notification: &Notification) {
    eprintln!("{} {}", notification.title, notification.message);
}

fn cart_json(cart: &CartState, notification: Option<&Notification>) -> Value {
    json!({
        "cart": cart,
        "notification": notification,
    })
}

fn emit_cart_human(cart: &CartState) {
    if cart.items.is_empty() {
        println!("Cart is empty.");
        return;
    }
    let mut rows = Vec::new();
    for item in &cart.items {
        rows.push(vec![
            item.id.clone(),
            item.name.clone(),
            item.quantity.to_string(),
            format!("${:.2}", item.price),
            format!("${:.2}", item.total_price),
        ]);
    }
    emit_table(&["ID", "ITEM", "QTY", "PRICE", "TOTAL"], &rows);
    println!("Total quantity: {}", cart.total_quantity);
}

fn emit_products_human(products: &[Product]) {
    let mut rows = Vec::new();
    for product in products {
        rows.push(vec![
            product.id.clone(),
            product.title.clone(),
            format!("${:.2}", product.price),
            product.description.clone(),
        ]);
    }
    emit_table(&["ID", "PRODUCT", "PRICE", "DESCRIPTION"], &rows);
}

fn emit_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if cell.len() > widths[index] {
                widths[index] = cell.len();
            }
        }
    }
    let header_line = headers
        .iter()
        .enumerate()
        .map(|(index, header)| format!("{header:<width$}", width = widths[index]))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header_line.trim_end());
    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, error_json, error_message, parse_bind};
    use cartlite::api::{Error, ErrorKind};
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_bind_rejects_garbage() {
        let err = parse_bind("not-an-addr").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn error_message_appends_item_and_status() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("item is not in the cart")
            .with_item("p9");
        assert_eq!(error_message(&err), "item is not in the cart (item: p9)");
    }

    #[test]
    fn error_json_is_enveloped() {
        let err = Error::new(ErrorKind::Usage).with_message("bad flag");
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Usage");
        assert_eq!(value["error"]["message"], "bad flag");
    }
}
