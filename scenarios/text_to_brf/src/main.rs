use gust_runner::prelude::*;
use std::time::Duration;

static BASIC: &[u8] = include_bytes!("../assets/basic.jpg");
static LENGTH: &[u8] = include_bytes!("../assets/length.jpg");
static WEIGHT: &[u8] = include_bytes!("../assets/weight.jpg");

fn transcribe_basic(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/text-to-braille/brf",
        Payload::multipart(vec![FilePart::jpeg("files", "basic.jpg", BASIC)]),
    )
}

fn transcribe_length(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/text-to-braille/brf",
        Payload::multipart(vec![FilePart::jpeg("files", "length.jpg", LENGTH)]),
    )
}

fn transcribe_weight(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/text-to-braille/brf",
        Payload::multipart(vec![FilePart::jpeg("files", "weight.jpg", WEIGHT)]),
    )
}

fn transcribe_all(ctx: &mut VuContext) -> GustResult<RequestOutcome> {
    ctx.dispatch(
        Method::POST,
        "/api/text-to-braille/brf",
        Payload::multipart(vec![
            FilePart::jpeg("files", "basic.jpg", BASIC),
            FilePart::jpeg("files1", "length.jpg", LENGTH),
            FilePart::jpeg("files2", "weight.jpg", WEIGHT),
        ]),
    )
}

fn transcription_scenario(name: &str, executor: Executor, behaviour: VuBehaviour) -> Scenario {
    Scenario::new(name, executor, behaviour)
        .with_check("status is 200", |outcome| outcome.status == 200)
        .with_check("response time < 500ms", |outcome| {
            outcome.latency < Duration::from_millis(500)
        })
        .with_check("response is not empty", |outcome| outcome.body_len() > 0)
}

fn main() -> GustResult<()> {
    let plan = TestPlanBuilder::new(env!("CARGO_PKG_NAME"), init())
        .with_scenario(transcription_scenario(
            "smokeTest",
            Executor::ConstantVus {
                vus: 1,
                duration: Duration::from_secs(5),
            },
            transcribe_basic,
        ))
        .with_scenario(transcription_scenario(
            "loadTest",
            Executor::ConstantVus {
                vus: 5,
                duration: Duration::from_secs(15),
            },
            transcribe_length,
        ))
        .with_scenario(transcription_scenario(
            "stressTest",
            Executor::RampingVus {
                start_vus: 1,
                stages: vec![
                    Stage::new(Duration::from_secs(10), 10),
                    Stage::new(Duration::from_secs(10), 20),
                    Stage::new(Duration::from_secs(10), 5),
                ],
            },
            transcribe_weight,
        ))
        .with_scenario(transcription_scenario(
            "spikeTest",
            Executor::RampingVus {
                start_vus: 1,
                stages: vec![
                    Stage::new(Duration::from_secs(5), 20),
                    Stage::new(Duration::from_secs(10), 1),
                ],
            },
            transcribe_all,
        ));

    let summary = run(plan)?;
    log::info!("Finished run [{}]", summary.run_id);

    Ok(())
}
