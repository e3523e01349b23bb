use gust_runner::prelude::*;
use std::time::Duration;

fn hit_api(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(Method::GET, "/api", Payload::Empty)
}

fn main() -> GustResult<()> {
    let plan = TestPlanBuilder::new(env!("CARGO_PKG_NAME"), init()).with_scenario(
        Scenario::new(
            "loadTest",
            Executor::ConstantVus {
                vus: 5,
                duration: Duration::from_secs(15),
            },
            hit_api,
        )
        .with_check("status is 200", |outcome| outcome.status == 200)
        .with_check("response time < 500ms", |outcome| {
            outcome.latency < Duration::from_millis(500)
        }),
    );

    let summary = run(plan)?;
    log::info!("Finished run [{}]", summary.run_id);

    Ok(())
}
