//! Purpose: Hold top-level CLI command dispatch for `cartlite`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit code semantics stay stable.

use super::*;
use std::io::BufRead;

pub(super) fn dispatch_command(command: Command, remote: String) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "cartlite", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_json(json!({
                "name": "cartlite",
                "version": env!("CARGO_PKG_VERSION"),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Shop { json } => {
            let products = demo_products();
            if json {
                emit_json(json!({ "products": products }));
            } else {
                emit_products_human(&products);
            }
            Ok(RunOutcome::ok())
        }
        Command::Show { json } => {
            let mut session = open_session(&remote)?;
            session.load();
            if json {
                emit_json(cart_json(session.cart(), session.notification()));
            } else {
                if let Some(notification) = session.notification() {
                    emit_notification(notification);
                }
                emit_cart_human(session.cart());
            }
            Ok(RunOutcome::ok())
        }
        Command::Add { id, json } => {
            let product = find_product(&id)?;
            let mut session = open_session(&remote)?;
            session.load();
            session.add_to_cart(&product);
            if json {
                emit_json(cart_json(session.cart(), session.notification()));
            } else {
                if let Some(notification) = session.notification() {
                    emit_notification(notification);
                }
                emit_cart_human(session.cart());
            }
            Ok(RunOutcome::ok())
        }
        Command::Remove { id, json } => {
            let mut session = open_session(&remote)?;
            session.load();
            session.remove_from_cart(&id).map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    err.with_hint("Check the cart first with `cartlite show`.")
                } else {
                    err
                }
            })?;
            if json {
                emit_json(cart_json(session.cart(), session.notification()));
            } else {
                if let Some(notification) = session.notification() {
                    emit_notification(notification);
                }
                emit_cart_human(session.cart());
            }
            Ok(RunOutcome::ok())
        }
        Command::Browse => run_browse(&remote),
        Command::Serve {
            bind,
            store,
            allow_non_loopback,
            cors_origin,
            max_body_bytes,
        } => {
            let config = serve::ServeConfig {
                bind: parse_bind(&bind)?,
                store,
                allow_non_loopback,
                cors_origins: cors_origin,
                max_body_bytes,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
    }
}

fn open_session(remote: &str) -> Result<Storefront<RemoteClient>, Error> {
    let client = RemoteClient::new(remote)?;
    Ok(Storefront::new(client))
}

fn run_browse(remote: &str) -> Result<RunOutcome, Error> {
    let mut session = open_session(remote)?;
    session.load();
    let mut last_notification = session.notification().cloned();
    if let Some(notification) = &last_notification {
        emit_notification(notification);
    }
    println!("Welcome to the shop. Commands: shop, cart, add <id>, remove <id>, quit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read line from stdin")
                .with_source(err)
        })?;
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("quit"), _) | (Some("exit"), _) => break,
            (Some("shop"), _) => emit_products_human(&demo_products()),
            (Some("cart"), _) => {
                session.toggle_cart();
                if !session.ui().cart_is_visible {
                    println!("Cart hidden.");
                }
            }
            (Some("add"), Some(id)) => match find_product(id) {
                Ok(product) => session.add_to_cart(&product),
                Err(err) => eprintln!("error: {}", error_message(&err)),
            },
            (Some("remove"), Some(id)) => {
                if let Err(err) = session.remove_from_cart(id) {
                    eprintln!("error: {}", error_message(&err));
                }
            }
            _ => println!("Commands: shop, cart, add <id>, remove <id>, quit."),
        }

        let notification = session.notification().cloned();
        if notification != last_notification {
            if let Some(notification) = &notification {
                emit_notification(notification);
            }
            last_notification = notification;
        }
        if session.ui().cart_is_visible {
            emit_cart_human(session.cart());
        }
    }
    Ok(RunOutcome::ok())
}
