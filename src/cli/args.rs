use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pricelist",
    version,
    about = "regional product price list with search and category filters",
    long_about = "Pricelist loads a regional product catalog and filters it by text, category and sub-category.\n\nExamples:\n  pricelist -d data/catalog.yml -g us -q steel\n  pricelist -d data/catalog.yml -g eu -c \"Steel Poles\" -f json\n  pricelist -d data/catalog.yml -o catalog.html\n  pricelist -d data/catalog.yml -i\n\nTip: Use --config to keep the dataset path and defaults out of every invocation."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored status output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "fmt",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json, html (table fragment) or page (standalone page)."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'd',
        long = "data",
        visible_alias = "catalog",
        value_name = "FILE",
        help_heading = "Input",
        help = "Catalog dataset (.json, .yml or .yaml)."
    )]
    pub data: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.pricelist/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file (to --config or ~/.pricelist/config.yml) and exit."
    )]
    pub init_config: bool,

    #[arg(
        long = "lr",
        visible_alias = "list-regions",
        help_heading = "Input",
        help = "List the regions in the dataset and exit."
    )]
    pub list_regions: bool,

    #[arg(
        short = 'g',
        long = "rg",
        visible_alias = "region",
        value_name = "REGION",
        help_heading = "Filters",
        help = "Region to show (defaults to the first region in the dataset)."
    )]
    pub region: Option<String>,

    #[arg(
        short = 'c',
        long = "cat",
        visible_alias = "category",
        value_name = "NAME",
        help_heading = "Filters",
        help = "Only show products in this main category."
    )]
    pub category: Option<String>,

    #[arg(
        short = 's',
        long = "sub",
        visible_alias = "sub-category",
        value_name = "NAME",
        help_heading = "Filters",
        help = "Only show products in this sub-category."
    )]
    pub sub_category: Option<String>,

    #[arg(
        short = 'q',
        long = "q",
        visible_alias = "query",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Case-insensitive text search over sku, pole height, wall thickness and categories."
    )]
    pub query: Option<String>,

    #[arg(
        short = 'i',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Session",
        help = "Read filter input from stdin and redraw after each pause in typing."
    )]
    pub interactive: bool,

    #[arg(
        long = "db",
        visible_alias = "debounce",
        value_name = "MS",
        help_heading = "Session",
        help = "Debounce window in milliseconds (150-300)."
    )]
    pub debounce: Option<u64>,
}
