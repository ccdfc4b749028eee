// ============================================================================
// Background Worker
// ============================================================================
// CONCEPT RUST : Command pattern avec channels tokio
// - L'event loop envoie des Command au worker
// - Chaque commande devient sa propre tâche tokio : un refresh lent ne bloque
//   pas un chargement d'historique
// - Les résultats reviennent en WorkerEvent, avec le numéro de génération de
//   la demande ; c'est App qui décide s'ils sont encore d'actualité
//
// Pas de Mutex : le worker ne touche jamais à App.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::api::MarketGateway;
use crate::app::{HistoryRequest, RefreshRequest};
use crate::models::{HistoricalSeries, MarketSnapshot, Sector};

/// Commandes envoyées au worker
#[derive(Debug, Clone)]
pub enum Command {
    /// Recharger titres + secteurs
    RefreshMarket(RefreshRequest),

    /// Charger l'historique d'un ticker
    LoadHistory(HistoryRequest),
}

/// Résultats renvoyés par le worker
#[derive(Debug)]
pub enum WorkerEvent {
    MarketLoaded {
        generation: u64,
        snapshot: MarketSnapshot,
        sectors: Vec<Sector>,
    },

    /// La tâche de refresh a paniqué ou a été annulée
    MarketFailed { generation: u64, reason: String },

    HistoryLoaded {
        generation: u64,
        series: HistoricalSeries,
    },

    HistoryFailed { generation: u64, reason: String },
}

/// Poignée sur le worker ; le dispatcher s'arrête quand elle est droppée
pub struct Worker {
    commands: UnboundedSender<Command>,
    dispatcher: JoinHandle<()>,
}

impl Worker {
    /// Lance le dispatcher sur le runtime `handle`
    ///
    /// CONCEPT RUST : Handle
    /// - main() est synchrone (TUI) ; le Handle permet de spawner des tâches
    ///   sur le runtime depuis le thread de l'UI
    pub fn spawn(handle: &Handle, gateway: Arc<MarketGateway>) -> (Self, UnboundedReceiver<WorkerEvent>) {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkerEvent>();

        let dispatcher = handle.spawn(async move {
            while let Some(command) = command_rx.recv().await {
                debug!(?command, "Worker received command");
                let gateway = Arc::clone(&gateway);
                let events = event_tx.clone();

                match command {
                    Command::RefreshMarket(request) => {
                        tokio::spawn(refresh_market(gateway, request, events));
                    }
                    Command::LoadHistory(request) => {
                        tokio::spawn(load_history(gateway, request, events));
                    }
                }
            }
            info!("Worker exiting (command channel closed)");
        });

        (
            Self {
                commands: command_tx,
                dispatcher,
            },
            event_rx,
        )
    }

    /// Envoie une commande au worker
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .context("Le worker est arrêté")
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Refresh complet : snapshot et secteurs en parallèle
///
/// Le fetch tourne dans une tâche séparée pour que la JoinError (panic)
/// remonte en MarketFailed au lieu de disparaître.
async fn refresh_market(
    gateway: Arc<MarketGateway>,
    request: RefreshRequest,
    events: UnboundedSender<WorkerEvent>,
) {
    let generation = request.generation;
    let fetch = tokio::spawn(async move {
        tokio::join!(gateway.fetch_snapshot(), gateway.fetch_sectors())
    });

    let event = match fetch.await {
        Ok((snapshot, sectors)) => {
            info!(generation, stocks = snapshot.stocks.len(), "Market data loaded");
            WorkerEvent::MarketLoaded {
                generation,
                snapshot,
                sectors,
            }
        }
        Err(e) => {
            error!(generation, error = %e, "Market refresh task failed");
            WorkerEvent::MarketFailed {
                generation,
                reason: e.to_string(),
            }
        }
    };

    // Receiver fermé : l'UI est partie, rien à faire
    let _ = events.send(event);
}

async fn load_history(
    gateway: Arc<MarketGateway>,
    request: HistoryRequest,
    events: UnboundedSender<WorkerEvent>,
) {
    let HistoryRequest {
        ticker,
        timeframe,
        generation,
    } = request;

    let fetch = {
        let ticker = ticker.clone();
        tokio::spawn(async move { gateway.fetch_history(&ticker, timeframe).await })
    };

    let event = match fetch.await {
        Ok(series) => {
            info!(generation, ticker = %ticker, points = series.len(), "History loaded");
            WorkerEvent::HistoryLoaded { generation, series }
        }
        Err(e) => {
            error!(generation, ticker = %ticker, error = %e, "History task failed");
            WorkerEvent::HistoryFailed {
                generation,
                reason: e.to_string(),
            }
        }
    };

    let _ = events.send(event);
}

// ============================================================================
// RefreshTimer
// ============================================================================
// CONCEPT RUST : RAII
// - Le timer vit tant que la valeur RefreshTimer existe
// - Drop annule la tâche : plus aucun tick après la destruction
// ============================================================================

/// Timer de rafraîchissement périodique
pub struct RefreshTimer {
    task: JoinHandle<()>,
}

impl RefreshTimer {
    /// Émet un tick immédiatement puis toutes les `period`
    pub fn start(handle: &Handle, period: Duration) -> (Self, UnboundedReceiver<()>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        // tokio::time::interval panique sur une période nulle
        let period = period.max(Duration::from_millis(1));

        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tick_tx.send(()).is_err() {
                    break;
                }
            }
        });

        debug!(?period, "Refresh timer started");
        (Self { task }, tick_rx)
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        debug!("Refresh timer stopped");
        self.task.abort();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
