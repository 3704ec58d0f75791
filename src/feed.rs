use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::analysis_fetch::{fetch_analysis_detail, fetch_analysis_page};
use crate::config;
use crate::http_client::http_client;
use crate::state::{Delta, ProviderCommand};

/// Background provider against the live analysis API. Commands are handled
/// one at a time on a single thread, so page responses always come back in
/// the order they were requested and at most one fetch is in flight.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let base = config::api_base();
        let client = match http_client() {
            Ok(client) => client,
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] HTTP client build failed: {err}")));
                return;
            }
        };
        let _ = tx.send(Delta::Log(format!("[INFO] Analysis feed: {base}")));

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchPage { page, limit } => {
                    match fetch_analysis_page(client, &base, page, limit) {
                        Ok(loaded) => {
                            let _ = tx.send(Delta::PageLoaded {
                                page,
                                items: loaded.items,
                                total: loaded.total,
                                pages: loaded.pages,
                            });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::PageFailed {
                                page,
                                message: format!("{err:#}"),
                            });
                        }
                    }
                }
                ProviderCommand::FetchDetail { id } => {
                    match fetch_analysis_detail(client, &base, &id) {
                        Ok(item) => {
                            let _ = tx.send(Delta::DetailLoaded { item });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::DetailFailed {
                                id,
                                message: format!("{err:#}"),
                            });
                        }
                    }
                }
            }
        }
    });
}
