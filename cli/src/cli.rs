use std::path::PathBuf;

use sumoprep::DEFAULT_MATCH_RADIUS;

/// Traffic-loop preprocessing CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "sumoprep", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Keep measurements whose accuracy report passes a threshold
    Accuracy(AccuracyArgs),

    /// Snap (road name, geopoint) pairs to network edges
    MatchEdges(MatchEdgesArgs),

    /// Fill missing edge ids from same-named roads
    Backfill(BackfillArgs),

    /// Join resolved edge ids back onto a measurement file
    Link(LinkArgs),

    /// Assign each measurement point to a statistical zone
    Zones(ZonesArgs),

    /// Export distinct detector coordinates
    Detectors(InOutArgs),

    /// Export the induction-loop description file
    InductionLoops(InOutArgs),

    /// Place detectors on the network via SUMO's mapDetectors script
    MapDetectors(MapDetectorsArgs),

    /// Keep measurements of a single day
    DailyFilter(DailyFilterArgs),

    /// Keep measurements within a date range
    FilterDates(FilterDatesArgs),

    /// Rewrite a dataset in chronological order
    Reorder(ReorderArgs),

    /// Replace missing direction values
    FillDirections(FillDirectionsArgs),

    /// Export the raw columns the real-flow consumer reads
    RealFlow(InOutArgs),

    /// Export the shadow-manager description table
    ShadowTypes(InOutArgs),

    /// Generate the detector flow file for a date and time slot
    Flow(FlowArgs),

    /// Generate the edge-data XML for a date and time slot
    EdgeData(EdgeDataArgs),

    /// Aggregate a flow file into edge data via SUMO's edgeDataFromFlow script
    EdgeDataFromFlow(EdgeDataFromFlowArgs),

    /// Annotate an edge-data file with per-edge vehicle density
    Density(DensityArgs),
}

#[derive(clap::Args, Debug)]
pub struct InOutArgs {
    /// Input measurement file (";"-separated)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct AccuracyArgs {
    /// Input measurement file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Accuracy report file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub accuracy: PathBuf,

    /// Output file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Minimum accepted reading percentage
    #[arg(short = 'p', long, default_value_t = 95)]
    pub percentage: i64,

    /// Date column shared by both files
    #[arg(long, default_value = "data")]
    pub date_column: String,

    /// Sensor id column shared by both files
    #[arg(long, default_value = "codice_spira")]
    pub sensor_column: String,
}

#[derive(clap::Args, Debug)]
pub struct MatchEdgesArgs {
    /// Input measurement file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// SUMO network file (.net.xml)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub net: PathBuf,

    /// Output road-names file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Search radius around each point, in network units
    #[arg(short, long, default_value_t = DEFAULT_MATCH_RADIUS)]
    pub radius: f64,
}

#[derive(clap::Args, Debug)]
pub struct BackfillArgs {
    /// Road-names file to update in place
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub roads: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct LinkArgs {
    /// Input measurement file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Road-names file holding resolved edge ids
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub roads: PathBuf,

    /// Output file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ZonesArgs {
    /// Measurement file to update in place
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Zone dataset file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub zones: PathBuf,

    /// Column written to the measurement file
    #[arg(long, default_value = "codZone")]
    pub zone_column: String,

    /// Zone id column of the zone dataset
    #[arg(long, default_value = "Codice Area Statistica")]
    pub zone_id_column: String,

    /// Geometry column of the zone dataset
    #[arg(long, default_value = "Geo Shape")]
    pub shape_column: String,
}

#[derive(clap::Args, Debug)]
pub struct MapDetectorsArgs {
    /// Detector coordinate file (id;lat;lon)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub coordinates: PathBuf,

    /// SUMO network file (.net.xml)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub net: PathBuf,

    /// Path to SUMO's mapDetectors.py
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub script: PathBuf,

    /// Detector definitions written by the script
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Measurement output file the generated detectors point at
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub det_output: PathBuf,

    /// Python interpreter used to run the script
    #[arg(long, default_value = "python")]
    pub python: String,
}

#[derive(clap::Args, Debug)]
pub struct DailyFilterArgs {
    /// Input measurement file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Date to keep (matched textually, dd/mm/yyyy)
    pub date: String,

    /// Output file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct FilterDatesArgs {
    /// Input measurement file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Range start, mm/dd/yyyy
    pub start: String,

    /// Range end, mm/dd/yyyy
    pub end: String,

    /// Output file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ReorderArgs {
    /// Input measurement file (dates as yyyy-mm-dd)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct FillDirectionsArgs {
    /// Measurement file to update in place
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Direction column to repair
    #[arg(long, default_value = "direzione")]
    pub column: String,

    /// Value written where the column is empty
    #[arg(long, default_value = "N")]
    pub default: String,
}

#[derive(clap::Args, Debug)]
pub struct FlowArgs {
    /// Input measurement file with edge ids
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Traffic-model file with per-edge velocities
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub model: PathBuf,

    /// Output flow file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Date to keep (matched textually, dd/mm/yyyy)
    #[arg(short, long)]
    pub date: String,

    /// Time slot, hh:mm-hh:mm
    #[arg(short, long)]
    pub time_slot: String,
}

#[derive(clap::Args, Debug)]
pub struct EdgeDataArgs {
    /// Input measurement file with edge ids
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output edge-data XML file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Date to keep (matched textually, dd/mm/yyyy)
    #[arg(short, long)]
    pub date: String,

    /// Time slot, hh:mm-hh:mm
    #[arg(short, long)]
    pub time_slot: String,

    /// Interval duration in seconds
    #[arg(long, default_value_t = 3600)]
    pub duration: u32,
}

#[derive(clap::Args, Debug)]
pub struct EdgeDataFromFlowArgs {
    /// Detector flow file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub flow: PathBuf,

    /// Detector definition file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub detectors: PathBuf,

    /// Path to SUMO's edgeDataFromFlow.py
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub script: PathBuf,

    /// Output edge-data file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Aggregation interval in minutes
    #[arg(short, long, default_value_t = 61)]
    pub interval: u32,

    /// Python interpreter used to run the script
    #[arg(long, default_value = "python")]
    pub python: String,
}

#[derive(clap::Args, Debug)]
pub struct DensityArgs {
    /// Edge-data XML file carrying qPKW counts
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// SUMO network file (.net.xml)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub net: PathBuf,

    /// Output annotated XML file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}
