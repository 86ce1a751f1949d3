use approx::assert_abs_diff_eq;
use mpc_stats::{
    Context, Error, Id, MPCExecutor, Node, OtTripleProvider, Result, TaskInfo, TaskRequest,
    TcpChannel, ThreadChannel, FIXED_POINT_PRECISION,
};
use std::{collections::BTreeMap, net::TcpListener, thread, time::Duration};

/// One least significant bit of the fixed-point encoding.
const EPS: f64 = 1.0 / (1u64 << FIXED_POINT_PRECISION) as f64;

fn request(party_name: &str, port0: u16) -> TaskRequest {
    let node = |port, party_id| Node {
        ip: "127.0.0.1".to_string(),
        port,
        party_id,
    };
    TaskRequest {
        task_info: TaskInfo {
            request_id: "statistics-test".to_string(),
            task_id: "mpc_statistics".to_string(),
            sub_task_id: String::new(),
        },
        party_name: party_name.to_string(),
        party_access_info: BTreeMap::from([
            ("party0".to_string(), node(port0, 0)),
            ("party1".to_string(), node(port0 + 1, 1)),
        ]),
    }
}

type Executor = MPCExecutor<ThreadChannel, OtTripleProvider>;

fn thread_executor(id: Id, mut ch: ThreadChannel) -> Result<Executor> {
    let name = if id == Id::Party0 { "party0" } else { "party1" };
    let triple_provider = OtTripleProvider::new(id, &mut ch)?;
    MPCExecutor::new(request(name, 50050), ch, triple_provider)
}

/// Run `f` for both parties over a [`ThreadChannel`] with real OT triples.
fn run<F>(f: F) -> (Result<Vec<f64>>, Result<Vec<f64>>)
where
    F: Fn(&mut Executor) -> Result<Vec<f64>> + Send + Copy + 'static,
{
    let (ch0, ch1) = ThreadChannel::pair();
    let party = move |id: Id, ch: ThreadChannel| -> Result<Vec<f64>> {
        let mut executor = thread_executor(id, ch)?;
        f(&mut executor)
    };
    let party0 = thread::spawn(move || party(Id::Party0, ch0));
    let party1 = thread::spawn(move || party(Id::Party1, ch1));
    (party0.join().unwrap(), party1.join().unwrap())
}

fn assert_all_close(res: &[f64], expected: &[f64]) {
    assert_eq!(res.len(), expected.len());
    for (r, e) in res.iter().zip(expected) {
        assert_abs_diff_eq!(*r, *e, epsilon = EPS);
    }
}

fn salaries(id: Id) -> Vec<f64> {
    match id {
        Id::Party0 => vec![1000.0, 2500.0, -1900.5, 3000.0, 0.0, 12.25],
        Id::Party1 => vec![1200.0, 2400.0, -1900.25, 3000.0, -7.0, 12.0],
    }
}

#[test]
fn sum() -> Result<()> {
    let (res0, res1) = run(|e| {
        let id = e.id();
        e.sum(&salaries(id))
    });
    let expected = [2200.0, 4900.0, -3800.75, 6000.0, -7.0, 24.25];
    assert_all_close(&res0?, &expected);
    assert_all_close(&res1?, &expected);
    Ok(())
}

#[test]
fn max() -> Result<()> {
    let (res0, res1) = run(|e| {
        let id = e.id();
        e.max(&salaries(id))
    });
    let expected = [1200.0, 2500.0, -1900.25, 3000.0, 0.0, 12.25];
    assert_all_close(&res0?, &expected);
    assert_all_close(&res1?, &expected);
    Ok(())
}

#[test]
fn min() -> Result<()> {
    let (res0, res1) = run(|e| {
        let id = e.id();
        e.min(&salaries(id))
    });
    let expected = [1000.0, 2400.0, -1900.5, 3000.0, -7.0, 12.0];
    assert_all_close(&res0?, &expected);
    assert_all_close(&res1?, &expected);
    Ok(())
}

#[test]
fn avg() -> Result<()> {
    let (res0, res1) = run(|e| {
        let id = e.id();
        let weights = match id {
            Id::Party0 => [1.0, 2.0, 3.0, 0.0, 1.0, 4.0],
            Id::Party1 => [1.0, 3.0, 1.0, 2.0, 0.0, 1.0],
        };
        e.avg(&salaries(id), &weights)
    });
    let expected = [1100.0, 980.0, -950.1875, 3000.0, -7.0, 4.85];
    for res in [res0?, res1?] {
        assert_eq!(res.len(), expected.len());
        for (r, e) in res.iter().zip(expected) {
            assert_abs_diff_eq!(*r, e, epsilon = 1e-3);
        }
    }
    Ok(())
}

#[test]
fn avg_with_zero_weight() {
    let (res0, res1) = run(|e| e.avg(&[1.0, 2.0], &[1.0, 0.0]));
    assert!(matches!(res0, Err(Error::DivByZero(1))));
    assert!(matches!(res1, Err(Error::DivByZero(1))));
}

/// What the `mpc-stats` binary computes: `1..=10` with weight 2 per column.
#[test]
fn demo_sequence() -> Result<()> {
    let (res0, res1) = run(|e| {
        let input = (1..=10).map(|i| i as f64).collect::<Vec<f64>>();
        let weights = vec![2.0; 10];
        let mut out = e.avg(&input, &weights)?;
        out.extend(e.sum(&input)?);
        out.extend(e.max(&input)?);
        out.extend(e.min(&input)?);
        Ok(out)
    });
    let input = (1..=10).map(|i| i as f64).collect::<Vec<f64>>();
    let expected = [
        input.iter().map(|x| x / 2.0).collect::<Vec<f64>>(),
        input.iter().map(|x| 2.0 * x).collect(),
        input.clone(),
        input,
    ]
    .concat();
    assert_all_close(&res0?, &expected);
    assert_all_close(&res1?, &expected);
    Ok(())
}

#[test]
fn empty_input() -> Result<()> {
    let (res0, res1) = run(|e| {
        let mut out = e.max::<f64>(&[])?;
        out.extend(e.avg::<f64, f64>(&[], &[])?);
        // still in sync afterwards
        out.extend(e.sum(&[1.0])?);
        Ok(out)
    });
    assert_all_close(&res0?, &[2.0]);
    assert_all_close(&res1?, &[2.0]);
    Ok(())
}

#[test]
fn shape_mismatch() {
    let (res0, res1) = run(|e| {
        let input = if e.id() == Id::Party0 {
            vec![1.0, 2.0]
        } else {
            vec![1.0, 2.0, 3.0]
        };
        e.max(&input)
    });
    assert!(matches!(
        res0,
        Err(Error::ShapeMismatch {
            local: 2,
            remote: 3
        })
    ));
    assert!(matches!(
        res1,
        Err(Error::ShapeMismatch {
            local: 3,
            remote: 2
        })
    ));
}

#[test]
fn tcp_executors() -> Result<()> {
    // only party 0 listens
    let port0 = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let run = move |name: &'static str| -> Result<(String, Vec<f64>)> {
        let context = Context::new(request(name, port0))?;
        let mut executor: MPCExecutor<TcpChannel, OtTripleProvider> =
            MPCExecutor::connect(&context.message()?)?;
        let input = if name == "party0" {
            [3.0, -4.0]
        } else {
            [5.0, -2.0]
        };
        let mut out = executor.sum(&input)?;
        out.extend(executor.max(&input)?);
        let sub_task_id = executor.request().task_info.sub_task_id.clone();
        executor.shutdown()?;
        Ok((sub_task_id, out))
    };
    // party 1 starts first and retries until party 0 listens
    let party1 = thread::spawn(move || run("party1"));
    thread::sleep(Duration::from_secs(1));
    let party0 = thread::spawn(move || run("party0"));
    let (sub_task0, res0) = party0.join().unwrap()?;
    let (sub_task1, res1) = party1.join().unwrap()?;
    assert_eq!(sub_task0, sub_task1);
    assert_all_close(&res0, &[8.0, -6.0, 5.0, -2.0]);
    assert_all_close(&res1, &[8.0, -6.0, 5.0, -2.0]);
    Ok(())
}
