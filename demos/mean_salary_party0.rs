use mpc_stats::{config::load_task_request, Context, MPCExecutor, Result};

fn main() -> Result<()> {
    env_logger::init();

    let request = load_task_request(Some("demos/party0.yaml".as_ref()), None)?;
    let context = Context::new(request)?;
    let mut executor = MPCExecutor::connect(&context.message()?)?;

    // salary totals and headcount per department
    let salaries = [10000, 25000, 19000, 30000];
    let headcount = [4, 10, 7, 12];

    let mean = executor.avg(&salaries, &headcount)?;
    let highest = executor.max(&salaries)?;
    println!("mean = {mean:?}");
    println!("highest = {highest:?}");

    executor.shutdown()
}
