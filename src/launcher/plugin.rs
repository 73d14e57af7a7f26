//! The request loop driven by the launcher host.

use std::io::{BufRead, Write};

use super::activate::{Outcome, handle_action};
use super::handlers::handle_query;
use super::items::{OnActivate, ResultItem};
use super::protocol::{Indice, Request, Response, SearchResult, parse_request, send};
use super::session::Session;
use super::LauncherError;

/// Serve requests from `input` until `Exit` or end of input.
///
/// Handler failures are shown to the user as a result item. Lines that are
/// not valid UTF-8 are decoded lossily. Only a broken input or output stream
/// ends the loop with an error.
pub fn run<R: BufRead, W: Write>(session: &mut Session, mut input: R, mut output: W) -> Result<(), LauncherError> {
    let mut results: Vec<ResultItem> = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request = match parse_request(line) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Ignoring request {:?}: {}", line, e);
                continue;
            }
        };

        match request {
            Request::Search(query) => {
                results = handle_query(session, &query).unwrap_or_else(|e| vec![unexpected_error(&e)]);
                show(&mut output, &results)?;
            }
            Request::Activate(id) => {
                let Some(item) = results.get(id as usize).cloned() else {
                    log::warn!("Activate for unknown result {}", id);
                    continue;
                };
                match item.on_activate {
                    OnActivate::Close => send(&mut output, &Response::Close)?,
                    OnActivate::Fill(text) => send(&mut output, &Response::Fill(text))?,
                    OnActivate::Run(action) => match handle_action(session, action) {
                        Ok(Outcome::Close) => send(&mut output, &Response::Close)?,
                        Ok(Outcome::Fill(text)) => send(&mut output, &Response::Fill(text))?,
                        Ok(Outcome::Show(items)) => {
                            results = items;
                            show(&mut output, &results)?;
                        }
                        Err(e) => {
                            results = vec![unexpected_error(&e)];
                            show(&mut output, &results)?;
                        }
                    },
                }
            }
            Request::Complete(id) => {
                if let Some(text) = results.get(id as usize).and_then(ResultItem::completion) {
                    send(&mut output, &Response::Fill(text.to_string()))?;
                }
            }
            Request::Interrupt => {}
            Request::Exit => break,
        }
    }
    Ok(())
}

fn show<W: Write>(output: &mut W, items: &[ResultItem]) -> Result<(), LauncherError> {
    send(output, &Response::Clear)?;
    for (id, item) in items.iter().enumerate() {
        send(
            output,
            &Response::Append(SearchResult {
                id: id as Indice,
                name: item.name.clone(),
                description: item.description.clone(),
            }),
        )?;
    }
    send(output, &Response::Finished)
}

fn unexpected_error(error: &LauncherError) -> ResultItem {
    log::error!("Unexpected error: {}", error);
    ResultItem::new("Unexpected Error", error.to_string())
}
