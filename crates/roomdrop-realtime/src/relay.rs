//! Rendezvous relay streaming bytes directly from a sender to a
//! receiver paired by a short code. No room, token, or persistence is
//! involved.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use roomdrop_core::traits::ByteStream;
use roomdrop_core::{ShareError, ShareResult};

/// Required length of a transfer code.
pub const TRANSFER_CODE_LEN: usize = 16;

/// Chunks buffered in flight between sender and receiver.
const PIPE_DEPTH: usize = 8;

/// Handed from sender to receiver at rendezvous.
struct Transfer {
    filename: String,
    stream: ByteStream,
}

/// One registered code: the rendezvous channel plus the session-done
/// token. The token's cancel is idempotent, so whichever side closes
/// first wins and every later close is a no-op.
struct Session {
    transfer_tx: mpsc::Sender<Transfer>,
    done: CancellationToken,
}

/// Pairs exactly one sender and one receiver per code.
///
/// State per code: absent, awaiting-sender once `receive` registers,
/// streaming once `send` attaches, closed when either side finishes or
/// cancels. The code is removed from the registry on session end.
#[derive(Default)]
pub struct DirectTransferRelay {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl DirectTransferRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for a sender on `code`, returning the filename and a stream
    /// of the transferred bytes.
    ///
    /// Fails `TransferCodeExists` when the code is already registered,
    /// and with a cancellation error when `ctx` fires or the session is
    /// closed before a sender arrives.
    pub async fn receive(
        &self,
        ctx: CancellationToken,
        code: &str,
    ) -> ShareResult<(String, ByteStream)> {
        check_code(code)?;

        let done = CancellationToken::new();
        let (transfer_tx, mut transfer_rx) = mpsc::channel(1);
        let session = Arc::new(Session {
            transfer_tx,
            done: done.clone(),
        });

        {
            let mut sessions = self.lock_sessions();
            if sessions.contains_key(code) {
                return Err(ShareError::TransferCodeExists);
            }
            sessions.insert(code.to_string(), session.clone());
        }
        debug!(code, "Transfer code awaiting sender");

        tokio::select! {
            transfer = transfer_rx.recv() => match transfer {
                Some(t) => Ok((t.filename, t.stream)),
                // All senders gone means the session was closed.
                None => Err(ShareError::Cancelled),
            },
            _ = ctx.cancelled() => {
                self.close(code, &session);
                Err(ShareError::Cancelled)
            }
            _ = done.cancelled() => {
                self.close(code, &session);
                Err(ShareError::Cancelled)
            }
        }
    }

    /// Attach to the receiver waiting on `code` and copy every byte from
    /// `reader` to it. Returns the number of bytes relayed.
    ///
    /// The copy stops on `ctx` cancellation, on session close, or on the
    /// receiver disappearing; in every failure mode the receiver's
    /// stream ends with an error rather than a clean EOF.
    pub async fn send(
        &self,
        ctx: CancellationToken,
        code: &str,
        filename: &str,
        mut reader: ByteStream,
    ) -> ShareResult<u64> {
        check_code(code)?;

        let session = self
            .lock_sessions()
            .get(code)
            .cloned()
            .ok_or(ShareError::TransferCodeNotFound)?;

        let (byte_tx, byte_rx) = mpsc::channel::<Result<Bytes, io::Error>>(PIPE_DEPTH);
        let stream: ByteStream = Box::pin(futures::stream::unfold(byte_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }));

        let transfer = Transfer {
            filename: filename.to_string(),
            stream,
        };
        tokio::select! {
            sent = session.transfer_tx.send(transfer) => {
                if sent.is_err() {
                    // Receiver tore the registration down first.
                    self.close(code, &session);
                    return Err(ShareError::TransferCodeNotFound);
                }
            }
            _ = ctx.cancelled() => {
                self.close(code, &session);
                return Err(ShareError::Cancelled);
            }
            _ = session.done.cancelled() => {
                self.close(code, &session);
                return Err(ShareError::Cancelled);
            }
        }
        debug!(code, filename, "Transfer streaming");

        let result = self.copy(&ctx, &session, &mut reader, &byte_tx).await;

        // Session end: close the pipe, release the code. Dropping
        // byte_tx is what ends the receiver's stream.
        drop(byte_tx);
        self.close(code, &session);
        result
    }

    /// Close the session registered under `code`, if any. Safe to call
    /// on absent or already-closed codes.
    pub fn cancel(&self, code: &str) -> bool {
        let session = self.lock_sessions().remove(code);
        match session {
            Some(session) => {
                session.done.cancel();
                debug!(code, "Transfer cancelled");
                true
            }
            None => false,
        }
    }

    /// Codes currently registered.
    pub fn active_codes(&self) -> usize {
        self.lock_sessions().len()
    }

    async fn copy(
        &self,
        ctx: &CancellationToken,
        session: &Session,
        reader: &mut ByteStream,
        byte_tx: &mpsc::Sender<Result<Bytes, io::Error>>,
    ) -> ShareResult<u64> {
        let mut copied = 0u64;
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    let _ = byte_tx.try_send(Err(io::Error::other("transfer cancelled by sender")));
                    return Err(ShareError::Cancelled);
                }
                _ = session.done.cancelled() => {
                    let _ = byte_tx.try_send(Err(io::Error::other("transfer session closed")));
                    return Err(ShareError::Cancelled);
                }
                chunk = reader.next() => match chunk {
                    Some(Ok(bytes)) => {
                        copied += bytes.len() as u64;
                        if byte_tx.send(Ok(bytes)).await.is_err() {
                            // Receiver dropped its stream mid-copy.
                            return Err(ShareError::Cancelled);
                        }
                    }
                    Some(Err(e)) => {
                        let message = format!("transfer source read error: {e}");
                        let _ = byte_tx.try_send(Err(e));
                        return Err(ShareError::Storage {
                            message,
                            source: None,
                        });
                    }
                    None => return Ok(copied),
                },
            }
        }
    }

    /// Remove `code` from the registry if it still maps to `session`,
    /// then mark the session done. Idempotent.
    fn close(&self, code: &str, session: &Arc<Session>) {
        let mut sessions = self.lock_sessions();
        if let Some(current) = sessions.get(code) {
            if Arc::ptr_eq(current, session) {
                sessions.remove(code);
            }
        }
        drop(sessions);
        session.done.cancel();
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn check_code(code: &str) -> ShareResult<()> {
    if code.len() != TRANSFER_CODE_LEN {
        return Err(ShareError::TransferCodeInvalidLength);
    }
    Ok(())
}
