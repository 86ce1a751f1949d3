use mpc_stats::{config::load_task_request, Context, MPCExecutor, Result};

fn main() -> Result<()> {
    env_logger::init();

    let request = load_task_request(Some("demos/party1.yaml".as_ref()), None)?;
    let context = Context::new(request)?;
    let mut executor = MPCExecutor::connect(&context.message()?)?;

    // salary totals and headcount per department
    let salaries = [12000, 24000, 20500, 27500];
    let headcount = [5, 9, 8, 11];

    let mean = executor.avg(&salaries, &headcount)?;
    let highest = executor.max(&salaries)?;
    println!("mean = {mean:?}");
    println!("highest = {highest:?}");

    executor.shutdown()
}
