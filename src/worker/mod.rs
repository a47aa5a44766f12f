use crate::config::DeployTarget;
use crate::deploy::{self, DeployReport, DeployStep};
use crate::llm::ModelClient;
use crate::pipeline::{self, Generation};
use crate::sql::SqlDialect;
use anyhow::Result;
use std::sync::mpsc;
use std::thread;
use tracing::error;

/// Messages sent to the worker thread
#[derive(Debug)]
pub enum WorkerMessage {
    Probe,
    Generate { description: String },
    Deploy { script: String },
    Shutdown,
}

/// Responses sent back from the worker thread
#[derive(Debug)]
pub enum WorkerResponse {
    ModelOnline {
        version: String,
    },
    ModelOffline {
        message: String,
    },
    Generated {
        description: String,
        generation: Generation,
    },
    GenerationFailed {
        message: String,
    },
    DeployProgress {
        step: DeployStep,
    },
    Deployed {
        report: DeployReport,
    },
    DeployFailed {
        message: String,
    },
}

/// Worker thread that handles model and backend calls
pub struct Worker {
    sender: mpsc::Sender<WorkerMessage>,
    receiver: mpsc::Receiver<WorkerResponse>,
    handle: thread::JoinHandle<()>,
}

impl Worker {
    /// Create a new worker owning the model client and deploy target
    pub fn new(
        client: Box<dyn ModelClient>,
        target: Option<DeployTarget>,
        dialect: SqlDialect,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let client = client;
            loop {
                match rx.recv() {
                    Ok(WorkerMessage::Probe) => {
                        let response = match client.probe() {
                            Ok(version) => WorkerResponse::ModelOnline { version },
                            Err(e) => WorkerResponse::ModelOffline {
                                message: e.to_string(),
                            },
                        };
                        let _ = response_tx.send(response);
                    }
                    Ok(WorkerMessage::Generate { description }) => {
                        match pipeline::generate(client.as_ref(), &description, dialect) {
                            Ok(generation) => {
                                let _ = response_tx.send(WorkerResponse::Generated {
                                    description,
                                    generation,
                                });
                            }
                            Err(e) => {
                                error!(error = %e, "generation failed");
                                let _ = response_tx.send(WorkerResponse::GenerationFailed {
                                    message: e.to_string(),
                                });
                            }
                        }
                    }
                    Ok(WorkerMessage::Deploy { script }) => {
                        let result = deploy::open_executor(target.as_ref()).and_then(|mut executor| {
                            deploy::deploy(&script, executor.as_mut(), |step| {
                                let _ = response_tx.send(WorkerResponse::DeployProgress { step });
                            })
                        });
                        match result {
                            Ok(report) => {
                                let _ = response_tx.send(WorkerResponse::Deployed { report });
                            }
                            Err(e) => {
                                error!(error = %e, "deployment failed");
                                let _ = response_tx.send(WorkerResponse::DeployFailed {
                                    message: e.to_string(),
                                });
                            }
                        }
                    }
                    Ok(WorkerMessage::Shutdown) => {
                        break;
                    }
                    Err(_) => {
                        // Channel closed, exit
                        break;
                    }
                }
            }
        });

        Self {
            sender: tx,
            receiver: response_rx,
            handle,
        }
    }

    /// Send a message to the worker
    pub fn send(&self, message: WorkerMessage) -> Result<()> {
        self.sender.send(message)?;
        Ok(())
    }

    /// Try to receive a response (non-blocking)
    pub fn try_recv(&self) -> Result<Option<WorkerResponse>> {
        match self.receiver.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(anyhow::anyhow!("Worker thread disconnected"))
            }
        }
    }

    /// Receive a response (blocking)
    pub fn recv(&self) -> Result<WorkerResponse> {
        self.receiver
            .recv()
            .map_err(|e| anyhow::anyhow!("Worker thread disconnected: {}", e))
    }

    /// Shutdown the worker thread
    pub fn shutdown(self) -> Result<()> {
        self.sender.send(WorkerMessage::Shutdown)?;
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("Worker thread panicked"))?;
        Ok(())
    }
}
