use crate::{
    arithmetic::{SecureArithmetic, CMP_AND_TRIPLES, CMP_MUL_TRIPLES},
    channel::{Channel, TcpChannel},
    context::{random_id, TaskRequest},
    error::{Error, Result},
    fixed_point::{EmbedFixedPoint, ToFixedPoint},
    triple_provider::{OtTripleProvider, TripleProvider},
    types::Id,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Instant};

/// Statistics computed column by column over the inputs of both parties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatisticsOp {
    Avg,
    Sum,
    Max,
    Min,
}

impl StatisticsOp {
    /// Triples (multiplication, AND) needed for `n` columns.
    fn triples(self, n: usize) -> (usize, usize) {
        match self {
            StatisticsOp::Avg | StatisticsOp::Sum => (0, 0),
            StatisticsOp::Max | StatisticsOp::Min => (CMP_MUL_TRIPLES * n, CMP_AND_TRIPLES * n),
        }
    }
}

impl fmt::Display for StatisticsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatisticsOp::Avg => "avg",
            StatisticsOp::Sum => "sum",
            StatisticsOp::Max => "max",
            StatisticsOp::Min => "min",
        };
        f.write_str(name)
    }
}

/// Announces an operation to the peer before any share is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct OpHeader {
    sub_task_id: String,
    op: StatisticsOp,
    shape: usize,
}

/// Control messages exchanged between the parties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
enum Control {
    SubTask(String),
    Header(OpHeader),
    Stop,
}

/// [`MPCExecutor`] computes statistics over the private columns of two parties.
///
/// Both parties must call the same operations in the same order with inputs of the
/// same length. Every call reveals only its result.
#[derive(Debug)]
pub struct MPCExecutor<C: Channel, T: TripleProvider> {
    request: TaskRequest,
    arithmetic: SecureArithmetic<C, T>,
}

impl MPCExecutor<TcpChannel, OtTripleProvider> {
    /// Create an [`MPCExecutor`] from a serialized [`TaskRequest`].
    ///
    /// Party 0 listens on its own address, party 1 connects to it.
    pub fn connect(message: &[u8]) -> Result<MPCExecutor<TcpChannel, OtTripleProvider>> {
        let request = TaskRequest::from_bytes(message)?;
        request.validate()?;
        let id = request.party_id()?;
        let (name, node) = request.node_of(Id::Party0)?;
        let addr = node.addr()?;
        info!("{id} connecting to {name} at {addr}");
        let mut ch = match id {
            Id::Party0 => TcpChannel::bind(addr)?,
            Id::Party1 => TcpChannel::connect(addr)?,
        };
        let triple_provider = OtTripleProvider::new(id, &mut ch)?;
        MPCExecutor::new(request, ch, triple_provider)
    }
}

impl<C: Channel, T: TripleProvider> MPCExecutor<C, T> {
    pub fn new(request: TaskRequest, ch: C, triple_provider: T) -> Result<MPCExecutor<C, T>> {
        request.validate()?;
        let id = request.party_id()?;
        Ok(MPCExecutor {
            request,
            arithmetic: SecureArithmetic::new(id, ch, triple_provider),
        })
    }

    pub fn id(&self) -> Id {
        self.arithmetic.id()
    }

    pub fn request(&self) -> &TaskRequest {
        &self.request
    }

    /// Per-column average `(v0 + v1) / (w0 + w1)`.
    ///
    /// The division needs a public divisor: both parties learn the per-column
    /// sums `v0 + v1` and total weights `w0 + w1`, and with them the peer's weights.
    pub fn avg<V, W>(&mut self, values: &[V], weights: &[W]) -> Result<Vec<f64>>
    where
        V: Into<f64> + Copy,
        W: Into<f64> + Copy,
    {
        let (sums, totals) = self.weighted_totals(values, weights)?;
        sums.iter()
            .zip(totals)
            .enumerate()
            .map(|(i, (sum, total))| {
                if total == 0.0 {
                    Err(Error::DivByZero(i))
                } else {
                    Ok(sum / total)
                }
            })
            .collect()
    }

    /// Revealed per-column sums `v0 + v1` and total weights `w0 + w1`.
    fn weighted_totals<V, W>(&mut self, values: &[V], weights: &[W]) -> Result<(Vec<f64>, Vec<f64>)>
    where
        V: Into<f64> + Copy,
        W: Into<f64> + Copy,
    {
        if values.len() != weights.len() {
            return Err(Error::LengthMismatch(values.len(), weights.len()));
        }
        if let Some((i, w)) = weights
            .iter()
            .map(|w| Into::<f64>::into(*w))
            .enumerate()
            .find(|(_, w)| *w < 0.0)
        {
            return Err(Error::NegativeWeight(i, w));
        }
        let values = embed(values)?;
        let weights = embed(weights)?;
        self.run(StatisticsOp::Avg, values.len(), |arithmetic| {
            let [v0, v1] = arithmetic.share_input(&values)?;
            let [w0, w1] = arithmetic.share_input(&weights)?;
            let sums = arithmetic.add(&v0, &v1);
            let totals = arithmetic.add(&w0, &w1);
            let mut sums = decode(arithmetic.reveal(&[sums, totals].concat())?)?;
            let totals = sums.split_off(values.len());
            Ok((sums, totals))
        })
    }

    /// Per-column sum `v0 + v1`.
    pub fn sum<V: Into<f64> + Copy>(&mut self, values: &[V]) -> Result<Vec<f64>> {
        let values = embed(values)?;
        self.run(StatisticsOp::Sum, values.len(), |arithmetic| {
            let [v0, v1] = arithmetic.share_input(&values)?;
            let sums = arithmetic.add(&v0, &v1);
            decode(arithmetic.reveal(&sums)?)
        })
    }

    /// Per-column maximum of `v0` and `v1`.
    pub fn max<V: Into<f64> + Copy>(&mut self, values: &[V]) -> Result<Vec<f64>> {
        let values = embed(values)?;
        self.run(StatisticsOp::Max, values.len(), |arithmetic| {
            let [v0, v1] = arithmetic.share_input(&values)?;
            let max = arithmetic.max(&v0, &v1)?;
            decode(arithmetic.reveal(&max)?)
        })
    }

    /// Per-column minimum of `v0` and `v1`.
    pub fn min<V: Into<f64> + Copy>(&mut self, values: &[V]) -> Result<Vec<f64>> {
        let values = embed(values)?;
        self.run(StatisticsOp::Min, values.len(), |arithmetic| {
            let [v0, v1] = arithmetic.share_input(&values)?;
            let min = arithmetic.min(&v0, &v1)?;
            decode(arithmetic.reveal(&min)?)
        })
    }

    /// End the task. Party 0 notifies party 1, which waits for the notification.
    pub fn shutdown(mut self) -> Result<()> {
        let id = self.arithmetic.id();
        let ch = self.arithmetic.channel();
        match id {
            Id::Party0 => ch.send_message(&Control::Stop)?,
            Id::Party1 => match ch.recv_message()? {
                Control::Stop => {}
                _ => return Err(Error::UnexpectedMessage),
            },
        }
        info!("task {} finished", self.request.task_info.task_id);
        Ok(())
    }

    fn run<F, R>(&mut self, op: StatisticsOp, shape: usize, f: F) -> Result<R>
    where
        F: FnOnce(&mut SecureArithmetic<C, T>) -> Result<R>,
        R: Default,
    {
        let start = Instant::now();
        let sub_task_id = self.negotiate_sub_task_id()?;
        self.request.task_info.sub_task_id = sub_task_id.clone();
        self.exchange_header(OpHeader {
            sub_task_id: sub_task_id.clone(),
            op,
            shape,
        })?;
        if shape == 0 {
            return Ok(R::default());
        }

        let (n_mul, n_and) = op.triples(shape);
        self.arithmetic.preprocess(n_mul, n_and)?;
        let res = f(&mut self.arithmetic)?;
        info!(
            "{op} over {shape} columns done (sub task {sub_task_id}), took {}ms",
            start.elapsed().as_millis()
        );
        Ok(res)
    }

    /// Party 0 generates a sub task id and sends it to party 1.
    fn negotiate_sub_task_id(&mut self) -> Result<String> {
        let id = self.arithmetic.id();
        let ch = self.arithmetic.channel();
        let sub_task_id = match id {
            Id::Party0 => {
                let sub_task_id = random_id();
                ch.send_message(&Control::SubTask(sub_task_id.clone()))?;
                sub_task_id
            }
            Id::Party1 => match ch.recv_message()? {
                Control::SubTask(sub_task_id) => sub_task_id,
                _ => return Err(Error::UnexpectedMessage),
            },
        };
        debug!("sub task id: {sub_task_id}");
        Ok(sub_task_id)
    }

    fn exchange_header(&mut self, local: OpHeader) -> Result<()> {
        let ch = self.arithmetic.channel();
        ch.send_message(&Control::Header(local.clone()))?;
        let remote = match ch.recv_message()? {
            Control::Header(header) => header,
            _ => return Err(Error::UnexpectedMessage),
        };
        if remote.sub_task_id != local.sub_task_id {
            return Err(Error::SubTaskMismatch {
                local: local.sub_task_id,
                remote: remote.sub_task_id,
            });
        }
        if remote.op != local.op {
            return Err(Error::OperationMismatch {
                local: local.op.to_string(),
                remote: remote.op.to_string(),
            });
        }
        if remote.shape != local.shape {
            return Err(Error::ShapeMismatch {
                local: local.shape,
                remote: remote.shape,
            });
        }
        Ok(())
    }
}

fn embed<V: Into<f64> + Copy>(values: &[V]) -> Result<Vec<u64>> {
    values.iter().map(|x| (*x).into().embed()).collect()
}

fn decode(values: Vec<u64>) -> Result<Vec<f64>> {
    Ok(values.into_iter().map(|x| x.to_fixed_point()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::ThreadChannel, context::tests::request, triple_provider::ZeroTripleProvider,
    };
    use approx::assert_relative_eq;
    use std::thread;

    type Executor = MPCExecutor<ThreadChannel, ZeroTripleProvider>;

    fn executors() -> (Executor, Executor) {
        let (ch0, ch1) = ThreadChannel::pair();
        (
            MPCExecutor::new(request("alice"), ch0, ZeroTripleProvider).unwrap(),
            MPCExecutor::new(request("bob"), ch1, ZeroTripleProvider).unwrap(),
        )
    }

    fn both<F>(f: F) -> (Result<Vec<f64>>, Result<Vec<f64>>)
    where
        F: Fn(&mut Executor) -> Result<Vec<f64>> + Send + Copy + 'static,
    {
        let (mut e0, mut e1) = executors();
        let party1 = thread::spawn(move || f(&mut e1));
        let res0 = f(&mut e0);
        (res0, party1.join().unwrap())
    }

    #[test]
    fn statistics_without_triples() -> Result<()> {
        let (res0, res1) = both(|e| {
            let x: Vec<f64> = if e.id() == Id::Party0 {
                vec![1.5, -2.0, 10.0]
            } else {
                vec![2.0, -3.0, 4.25]
            };
            let mut out = e.sum(&x)?;
            out.extend(e.max(&x)?);
            out.extend(e.min(&x)?);
            out.extend(e.avg(&x, &[1.0, 1.0, 2.0])?);
            Ok(out)
        });
        let (res0, res1) = (res0?, res1?);
        let expected = [
            3.5, -5.0, 14.25, // sum
            2.0, -2.0, 10.0, // max
            1.5, -3.0, 4.25, // min
            1.75, -2.5, 3.5625, // avg
        ];
        for (r0, (r1, e)) in res0.iter().zip(res1.iter().zip(expected)) {
            assert_relative_eq!(*r0, e);
            assert_relative_eq!(*r1, e);
        }
        Ok(())
    }

    #[test]
    fn avg_reveals_totals() -> Result<()> {
        let (mut e0, mut e1) = executors();
        let party1 = thread::spawn(move || e1.weighted_totals(&[6.0], &[3.0]));
        let (sums0, totals0) = e0.weighted_totals(&[2.0], &[1.0])?;
        let (sums1, totals1) = party1.join().unwrap()?;
        assert_eq!((sums0, totals0), (vec![8.0], vec![4.0]));
        assert_eq!((sums1, totals1), (vec![8.0], vec![4.0]));
        Ok(())
    }

    #[test]
    fn integer_inputs() -> Result<()> {
        let (res0, res1) = both(|e| {
            let x: [i32; 3] = if e.id() == Id::Party0 {
                [7, -3, 0]
            } else {
                [2, 5, -9]
            };
            let mut out = e.sum(&x)?;
            out.extend(e.max(&x)?);
            out.extend(e.avg(&x, &[2u8, 2, 1])?);
            Ok(out)
        });
        let expected = [9.0, 2.0, -9.0, 7.0, 5.0, 0.0, 2.25, 0.5, -4.5];
        assert_eq!(res0?, expected);
        assert_eq!(res1?, expected);
        Ok(())
    }

    #[test]
    fn sub_task_id_is_shared() {
        let (mut e0, mut e1) = executors();
        let party1 = thread::spawn(move || {
            e1.sum(&[1.0]).unwrap();
            e1.request().task_info.sub_task_id.clone()
        });
        e0.sum(&[1.0]).unwrap();
        let id1 = party1.join().unwrap();
        assert_eq!(e0.request().task_info.sub_task_id, id1);
        assert_eq!(id1.len(), 32);
    }

    #[test]
    fn operation_mismatch() {
        let (mut e0, mut e1) = executors();
        let party1 = thread::spawn(move || e1.max(&[1.0]));
        let res0 = e0.sum(&[1.0]);
        assert!(matches!(res0, Err(Error::OperationMismatch { .. })));
        assert!(matches!(
            party1.join().unwrap(),
            Err(Error::OperationMismatch { .. })
        ));
    }

    #[test]
    fn sub_task_mismatch() -> Result<()> {
        let (mut ch0, ch1) = ThreadChannel::pair();
        let mut e1 = MPCExecutor::new(request("bob"), ch1, ZeroTripleProvider)?;
        let party0 = thread::spawn(move || -> Result<Control> {
            ch0.send_message(&Control::SubTask("a".to_string()))?;
            ch0.send_message(&Control::Header(OpHeader {
                sub_task_id: "b".to_string(),
                op: StatisticsOp::Sum,
                shape: 1,
            }))?;
            ch0.recv_message()
        });
        let res = e1.sum(&[1.0]);
        assert!(matches!(
            res,
            Err(Error::SubTaskMismatch { local, remote }) if local == "a" && remote == "b"
        ));
        assert!(matches!(party0.join().unwrap()?, Control::Header(_)));
        Ok(())
    }

    #[test]
    fn local_validation() {
        let (mut e0, _e1) = executors();
        assert!(matches!(
            e0.avg(&[1.0, 2.0], &[1.0]),
            Err(Error::LengthMismatch(2, 1))
        ));
        assert!(matches!(
            e0.avg(&[1.0], &[-1.0]),
            Err(Error::NegativeWeight(0, _))
        ));
        assert!(matches!(
            e0.sum(&[f64::INFINITY]),
            Err(Error::FixedPointEmbedding(_))
        ));
    }

    #[test]
    fn shutdown() {
        let (e0, e1) = executors();
        let party1 = thread::spawn(move || e1.shutdown());
        e0.shutdown().unwrap();
        party1.join().unwrap().unwrap();
    }
}
