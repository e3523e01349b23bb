use gust_runner::prelude::*;
use std::time::Duration;

static BRAILLE_POEM: &[u8] = include_bytes!("../assets/braille-poem.jpg");

fn detect_braille(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/braille-to-text",
        Payload::multipart(vec![FilePart::jpeg("file", "braille-poem.jpg", BRAILLE_POEM)]),
    )
}

fn detection_scenario(name: &str, executor: Executor) -> Scenario {
    Scenario::new(name, executor, detect_braille)
        .with_check("status is 200", |outcome| outcome.status == 200)
        .with_check("response time < 500ms", |outcome| {
            outcome.latency < Duration::from_millis(500)
        })
        .with_check("response is not empty", |outcome| outcome.body_len() > 0)
}

fn main() -> GustResult<()> {
    let plan = TestPlanBuilder::new(env!("CARGO_PKG_NAME"), init())
        .with_scenario(detection_scenario(
            "smokeTest",
            Executor::ConstantVus {
                vus: 1,
                duration: Duration::from_secs(5),
            },
        ))
        .with_scenario(detection_scenario(
            "loadTest",
            Executor::ConstantVus {
                vus: 5,
                duration: Duration::from_secs(15),
            },
        ))
        .with_scenario(detection_scenario(
            "stressTest",
            Executor::RampingVus {
                start_vus: 1,
                stages: vec![
                    Stage::new(Duration::from_secs(10), 10),
                    Stage::new(Duration::from_secs(10), 20),
                    Stage::new(Duration::from_secs(10), 5),
                ],
            },
        ))
        .with_scenario(detection_scenario(
            "spikeTest",
            Executor::RampingVus {
                start_vus: 1,
                stages: vec![
                    Stage::new(Duration::from_secs(5), 20),
                    Stage::new(Duration::from_secs(10), 1),
                ],
            },
        ));

    let summary = run(plan)?;
    log::info!("Finished run [{}]", summary.run_id);

    Ok(())
}
