/// Return this error from a scenario behaviour to stop the current VU without failing the run.
///
/// Use this when a VU hits a condition that makes further iterations pointless for that VU
/// but not for the scenario. The remaining VUs keep running and the summary is still produced.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct VuBailError {
    msg: String,
}

impl Default for VuBailError {
    fn default() -> Self {
        Self {
            msg: "VU is bailing".to_string(),
        }
    }
}
