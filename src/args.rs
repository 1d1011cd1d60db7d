use argh::FromArgs;

#[derive(FromArgs, Clone, Debug)]
/// Fetch channel schedules and write one XMLTV guide per channel.
pub(crate) struct Args {
    /// directory the guides are written to [default: xml_schedules]
    #[argh(option, short = 'o', default = "String::from(\"xml_schedules\")")]
    pub(crate) output_dir: String,

    /// JSON file listing the channels to build; replaces the built-in list
    #[argh(option, short = 'c')]
    pub(crate) channels: Option<String>,

    /// per-request timeout in seconds [default: 30]
    #[argh(option, default = "30")]
    pub(crate) timeout: u64,
}
