use crate::{
    error::{Error, Result},
    ot::utils::block::Block,
};
use bytes::Bytes;
use curve25519_dalek::{ristretto::CompressedRistretto, RistrettoPoint};
use futures::{SinkExt, StreamExt};
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    net::SocketAddr,
    sync::mpsc::{Receiver, Sender},
    thread,
    time::Duration,
};
use tokio::{
    net::{TcpListener, TcpStream},
    runtime::Runtime,
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Delay between two connection attempts of [`TcpChannel::connect`].
const RETRY_INTERVAL: Duration = Duration::from_millis(500);
/// Number of connection attempts of [`TcpChannel::connect`].
const RETRY_COUNT: usize = 100;
/// Share vectors of large inputs exceed the codec default of 8 MiB.
const MAX_FRAME_LENGTH: usize = 1 << 30;

/// [`Channel`] trait for communication between parties.
///
/// Implementors only move frames; the provided methods encode the protocol messages.
pub trait Channel {
    fn send_bytes(&mut self, bytes: Bytes) -> Result<()>;
    fn recv_bytes(&mut self) -> Result<Bytes>;

    fn send_message<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        let bytes = bincode::serialize(msg)?;
        self.send_bytes(Bytes::from(bytes))
    }

    fn recv_message<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.recv_bytes()?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn send_shares(&mut self, shares: &[u64]) -> Result<()> {
        self.send_message(&shares)
    }

    fn recv_shares(&mut self) -> Result<Vec<u64>> {
        self.recv_message()
    }

    fn send_points(&mut self, points: &[RistrettoPoint]) -> Result<()> {
        let compressed = points
            .iter()
            .map(|p| p.compress().to_bytes())
            .collect::<Vec<[u8; 32]>>();
        self.send_message(&compressed)
    }

    fn recv_points(&mut self) -> Result<Vec<RistrettoPoint>> {
        let compressed: Vec<[u8; 32]> = self.recv_message()?;
        compressed
            .into_iter()
            .map(|bytes| {
                CompressedRistretto(bytes)
                    .decompress()
                    .ok_or(Error::UnexpectedMessage)
            })
            .collect()
    }

    fn send_point(&mut self, point: &RistrettoPoint) -> Result<()> {
        self.send_points(std::slice::from_ref(point))
    }

    fn recv_point(&mut self) -> Result<RistrettoPoint> {
        self.recv_points()?
            .pop()
            .ok_or(Error::UnexpectedMessage)
    }

    fn send_blocks(&mut self, blocks: &[Block]) -> Result<()> {
        self.send_message(&blocks)
    }

    fn recv_blocks(&mut self) -> Result<Vec<Block>> {
        self.recv_message()
    }
}

/// [`ThreadChannel`] for communication between threads.
#[derive(Debug)]
pub struct ThreadChannel {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
}

impl ThreadChannel {
    pub fn new(tx: Sender<Bytes>, rx: Receiver<Bytes>) -> Self {
        ThreadChannel { tx, rx }
    }

    /// Create two connected [`ThreadChannel`]s.
    pub fn pair() -> (ThreadChannel, ThreadChannel) {
        let (tx0, rx0) = std::sync::mpsc::channel();
        let (tx1, rx1) = std::sync::mpsc::channel();
        (ThreadChannel::new(tx0, rx1), ThreadChannel::new(tx1, rx0))
    }
}

impl Channel for ThreadChannel {
    fn send_bytes(&mut self, bytes: Bytes) -> Result<()> {
        self.tx.send(bytes).map_err(|_| Error::ChannelClosed)
    }

    fn recv_bytes(&mut self) -> Result<Bytes> {
        self.rx.recv().map_err(|_| Error::ChannelClosed)
    }
}

/// [`TcpChannel`] for communication via a TCP connection.
#[derive(Debug)]
pub struct TcpChannel {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    rt: Runtime,
}

impl TcpChannel {
    /// Listen on `addr` and accept the connection of the other party.
    pub fn bind(addr: SocketAddr) -> Result<TcpChannel> {
        let rt = runtime()?;
        let stream = rt.block_on(async {
            let listener = TcpListener::bind(addr).await?;
            info!("listening on {addr}");
            let (stream, peer) = listener.accept().await?;
            info!("accepted connection from {peer}");
            Ok::<_, Error>(stream)
        })?;
        TcpChannel::from_stream(stream, rt)
    }

    /// Connect to the other party listening on `addr`.
    pub fn connect(addr: SocketAddr) -> Result<TcpChannel> {
        let rt = runtime()?;
        let mut attempt = 0;
        let stream = loop {
            match rt.block_on(TcpStream::connect(addr)) {
                Ok(stream) => break stream,
                Err(err) if attempt + 1 < RETRY_COUNT => {
                    debug!("connect to {addr} failed ({err}), retrying");
                    attempt += 1;
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        };
        info!("connected to {addr}");
        TcpChannel::from_stream(stream, rt)
    }

    fn from_stream(stream: TcpStream, rt: Runtime) -> Result<TcpChannel> {
        stream.set_nodelay(true)?;
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_LENGTH)
            .new_codec();
        let framed = Framed::new(stream, codec);
        Ok(TcpChannel { framed, rt })
    }
}

fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?)
}

impl Channel for TcpChannel {
    fn send_bytes(&mut self, bytes: Bytes) -> Result<()> {
        Ok(self.rt.block_on(self.framed.send(bytes))?)
    }

    fn recv_bytes(&mut self) -> Result<Bytes> {
        match self.rt.block_on(self.framed.next()) {
            Some(frame) => Ok(frame?.freeze()),
            None => Err(Error::ChannelClosed),
        }
    }
}
