use gust_runner::prelude::*;
use std::time::Duration;

static BASIC: &[u8] = include_bytes!("../assets/basic.jpg");
static LENGTH: &[u8] = include_bytes!("../assets/length.jpg");
static WEIGHT: &[u8] = include_bytes!("../assets/weight.jpg");

fn convert_basic(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/braille-to-text/text",
        Payload::multipart(vec![FilePart::jpeg("files", "basic.jpg", BASIC)]),
    )
}

fn convert_length(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/braille-to-text/text",
        Payload::multipart(vec![FilePart::jpeg("files", "length.jpg", LENGTH)]),
    )
}

fn convert_weight(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/braille-to-text/text",
        Payload::multipart(vec![FilePart::jpeg("files", "weight.jpg", WEIGHT)]),
    )
}

/// Sends all three pages in one request, the heaviest shape the endpoint accepts.
fn convert_all(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/braille-to-text/text",
        Payload::multipart(vec![
            FilePart::jpeg("files", "basic.jpg", BASIC),
            FilePart::jpeg("files1", "length.jpg", LENGTH),
            FilePart::jpeg("files2", "weight.jpg", WEIGHT),
        ]),
    )
}

fn conversion_scenario(name: &str, executor: Executor, behaviour: VuBehaviour) -> Scenario {
    Scenario::new(name, executor, behaviour)
        .with_check("status is 200", |outcome| outcome.status == 200)
        .with_check("response time < 500ms", |outcome| {
            outcome.latency < Duration::from_millis(500)
        })
        .with_check("response is not empty", |outcome| outcome.body_len() > 0)
}

fn main() -> GustResult<()> {
    let plan = TestPlanBuilder::new(env!("CARGO_PKG_NAME"), init())
        .with_scenario(conversion_scenario(
            "smokeTest",
            Executor::ConstantVus {
                vus: 1,
                duration: Duration::from_secs(5),
            },
            convert_basic,
        ))
        .with_scenario(conversion_scenario(
            "loadTest",
            Executor::ConstantVus {
                vus: 5,
                duration: Duration::from_secs(15),
            },
            convert_length,
        ))
        .with_scenario(conversion_scenario(
            "stressTest",
            Executor::RampingVus {
                start_vus: 1,
                stages: vec![
                    Stage::new(Duration::from_secs(10), 10),
                    Stage::new(Duration::from_secs(10), 20),
                    Stage::new(Duration::from_secs(10), 5),
                ],
            },
            convert_weight,
        ))
        .with_scenario(conversion_scenario(
            "spikeTest",
            Executor::RampingVus {
                start_vus: 1,
                stages: vec![
                    Stage::new(Duration::from_secs(5), 20),
                    Stage::new(Duration::from_secs(10), 1),
                ],
            },
            convert_all,
        ));

    let summary = run(plan)?;
    log::info!("Finished run [{}]", summary.run_id);

    Ok(())
}
