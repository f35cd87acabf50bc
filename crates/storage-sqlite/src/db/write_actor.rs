//! Serializes all writes through one thread so SQLite never sees competing
//! writers. Each job runs inside an immediate transaction.

use diesel::SqliteConnection;
use log::error;
use releasesync_core::errors::Error;
use releasesync_core::Result;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

enum TxError {
    Diesel(diesel::result::Error),
    App(Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

impl From<TxError> for Error {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Diesel(e) => StorageError::from(e).into(),
            TxError::App(e) => e,
        }
    }
}

#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Runs `f` on the writer thread and waits for its result. An error
    /// returned from `f` rolls the transaction back.
    pub async fn exec<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel::<Result<T>>();
        let job: Job = Box::new(move |conn: &mut SqliteConnection| {
            let result = conn
                .immediate_transaction::<T, TxError, _>(|c| f(c).map_err(TxError::App))
                .map_err(Error::from);
            let _ = ret_tx.send(result);
        });

        self.tx
            .send(job)
            .map_err(|_| StorageError::WriterUnavailable("writer thread stopped".to_string()))?;
        ret_rx.await.map_err(|_| {
            Error::from(StorageError::WriterUnavailable(
                "writer dropped the job".to_string(),
            ))
        })?
    }
}

/// Starts the writer thread. It exits once every [`WriteHandle`] is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
    std::thread::Builder::new()
        .name("releasesync-db-writer".to_string())
        .spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut *conn),
                    // Dropping the job closes its result channel.
                    Err(e) => error!("[Storage] Writer could not get a connection: {}", e),
                }
            }
        })
        .map(|_| ())
        .unwrap_or_else(|e| error!("[Storage] Failed to start writer thread: {}", e));
    WriteHandle { tx }
}
