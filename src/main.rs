// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Interactive terminal front-end for the certificate verification client.
//!
//! A dedicated thread owns the line editor; the async loop owns all
//! application state and multiplexes user commands with effect completions.

use std::sync::Arc;
use std::thread;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use certverify_client::app::{App, Msg};
use certverify_client::cli::{self, Command};
use certverify_client::config::Config;
use certverify_client::gateway::HttpCertificateGateway;
use certverify_client::identity::HttpIdentityProvider;
use certverify_client::render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        backend = %config.backend_url,
        identity = %config.identity_url,
        "starting certificate verification client"
    );

    let identity = Arc::new(HttpIdentityProvider::new(
        &config.identity_url,
        config.login_window,
        config.http_timeout,
    )?);
    let gateway = Arc::new(HttpCertificateGateway::new(
        &config.backend_url,
        config.http_timeout,
    )?);

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Msg>();
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();

    // The line editor blocks, so it lives on its own thread. Dropping the
    // receiver ends the session; the thread notices on the next send.
    thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("failed to start line editor: {e}");
                return;
            }
        };
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("input error: {e}");
                    break;
                }
            }
        }
    });

    let mut app = App::new(identity, gateway, msg_tx.clone());
    msg_tx
        .send(Msg::Initialize)
        .expect("own receiver is still open");

    println!("{}", render::draw(app.tree()));

    loop {
        tokio::select! {
            Some(msg) = msg_rx.recv() => {
                app.update(msg);
                println!("{}", render::draw(app.tree()));
            }
            line = line_rx.recv() => {
                let Some(line) = line else {
                    info!("input closed; exiting");
                    break;
                };
                match cli::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => println!("{}", cli::HELP),
                    Ok(Some(Command::Show)) => println!("{}", render::draw(app.tree())),
                    Ok(Some(command)) => {
                        debug!(?command, "dispatching");
                        app.apply_command(command);
                        println!("{}", render::draw(app.tree()));
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    Ok(())
}
