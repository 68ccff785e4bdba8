use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use is_terminal::IsTerminal;
use fracturedjson::{
    CommentPolicy, EolStyle, Formatter, FracturedJsonOptions, NumberListAlignment,
    TableCommaPlacement,
};

/// A human-friendly JSON formatter with smart line breaks and table alignment.
///
/// fjson reads JSON from stdin or files and outputs beautifully formatted JSON.
/// Similar to jq but focused on producing highly readable output with aligned
/// columns and smart wrapping.
#[derive(Parser, Debug)]
#[command(name = "fjson")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file(s). If not specified, reads from stdin.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output file. If not specified, writes to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Minify output (remove all whitespace).
    #[arg(short, long)]
    compact: bool,

    /// Maximum line length before wrapping.
    #[arg(short = 'w', long, default_value = "120")]
    max_width: usize,

    /// Number of spaces per indentation level.
    #[arg(short, long, default_value = "4")]
    indent: usize,

    /// Use tabs instead of spaces for indentation.
    #[arg(short = 't', long)]
    tabs: bool,

    /// Line ending style.
    #[arg(long, value_enum, default_value = "lf")]
    eol: EolStyleArg,

    /// How to handle comments in input.
    #[arg(long, value_enum, default_value = "error")]
    comments: CommentPolicyArg,

    /// Allow trailing commas in input.
    #[arg(long)]
    trailing_commas: bool,

    /// Preserve blank lines from input.
    #[arg(long)]
    preserve_blanks: bool,

    /// Number alignment style in arrays.
    #[arg(long, value_enum, default_value = "decimal")]
    number_align: NumberAlignArg,

    /// Maximum nesting depth for inline formatting (-1 to disable).
    #[arg(long, default_value = "2")]
    max_inline_complexity: isize,

    /// Maximum nesting depth for table formatting (-1 to disable).
    #[arg(long, default_value = "2")]
    max_table_complexity: isize,

    /// Add padding inside brackets for simple arrays/objects.
    #[arg(long)]
    simple_bracket_padding: bool,

    /// Disable padding inside brackets for nested arrays/objects.
    #[arg(long)]
    no_nested_bracket_padding: bool,

    /// Cap on content width used when deciding whether to inline, separate from max-width.
    #[arg(long)]
    max_inline_length: Option<usize>,

    /// Maximum nesting depth for arrays to use compact multi-line formatting (-1 to disable).
    #[arg(long, default_value = "2")]
    max_compact_array_complexity: isize,

    /// Maximum spaces to use for property name padding in table/expanded output.
    #[arg(long, default_value = "16")]
    max_prop_name_padding: usize,

    /// Put the colon before property name padding instead of after.
    #[arg(long)]
    colon_before_prop_name_padding: bool,

    /// Where to place commas relative to column padding in table output.
    #[arg(long, value_enum, default_value = "before-except-numbers")]
    table_comma_placement: TableCommaPlacementArg,

    /// Depth at which containers are always expanded, never inlined (-1 to disable).
    #[arg(long, default_value = "-1")]
    always_expand_depth: isize,

    /// Disable the space after colons.
    #[arg(long)]
    no_colon_padding: bool,

    /// Disable the space after commas.
    #[arg(long)]
    no_comma_padding: bool,

    /// Disable the space before comments.
    #[arg(long)]
    no_comment_padding: bool,

    /// Minimum percentage of populated columns required to format an object array as a table.
    #[arg(long, default_value = "75")]
    table_object_minimum_similarity: usize,

    /// Minimum percentage of populated columns required to format an array-of-arrays as a table.
    #[arg(long, default_value = "50")]
    table_array_minimum_similarity: usize,

    /// Treat East-Asian fullwidth characters as occupying two columns when measuring width.
    #[arg(long)]
    east_asian_width: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableCommaPlacementArg {
    BeforePadding,
    AfterPadding,
    BeforeExceptNumbers,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EolStyleArg {
    Lf,
    Crlf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CommentPolicyArg {
    Error,
    Remove,
    Preserve,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NumberAlignArg {
    Left,
    Right,
    Decimal,
    Normalize,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("fjson: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Read input
    let input = if args.files.is_empty() {
        if io::stdin().is_terminal() {
            return Err("no input file given and stdin is a terminal; pipe JSON in or pass a file".into());
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        let mut combined = String::new();
        for path in &args.files {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
            combined.push_str(&content);
        }
        combined
    };

    // Configure formatter
    let mut formatter = Formatter::new();
    configure_options(&mut formatter.options, &args);

    // Format
    let output = if args.compact {
        formatter.minify(&input)?
    } else {
        formatter.reformat(&input, 0)?
    };

    // Write output
    if let Some(path) = args.output {
        fs::write(&path, &output)
            .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
    } else {
        io::stdout().write_all(output.as_bytes())?;
    }

    Ok(())
}

fn configure_options(opts: &mut FracturedJsonOptions, args: &Args) {
    opts.max_total_line_length = args.max_width;
    opts.indent_spaces = args.indent;
    opts.use_tab_to_indent = args.tabs;

    opts.json_eol_style = match args.eol {
        EolStyleArg::Lf => EolStyle::Lf,
        EolStyleArg::Crlf => EolStyle::Crlf,
    };

    opts.comment_policy = match args.comments {
        CommentPolicyArg::Error => CommentPolicy::TreatAsError,
        CommentPolicyArg::Remove => CommentPolicy::Remove,
        CommentPolicyArg::Preserve => CommentPolicy::Preserve,
    };

    opts.number_list_alignment = match args.number_align {
        NumberAlignArg::Left => NumberListAlignment::Left,
        NumberAlignArg::Right => NumberListAlignment::Right,
        NumberAlignArg::Decimal => NumberListAlignment::Decimal,
        NumberAlignArg::Normalize => NumberListAlignment::Normalize,
    };

    opts.allow_trailing_commas = args.trailing_commas;
    opts.preserve_blank_lines = args.preserve_blanks;
    opts.max_inline_complexity = args.max_inline_complexity;
    opts.max_table_row_complexity = args.max_table_complexity;
    opts.simple_bracket_padding = args.simple_bracket_padding;
    opts.nested_bracket_padding = !args.no_nested_bracket_padding;

    if let Some(max_inline_length) = args.max_inline_length {
        opts.max_inline_length = max_inline_length;
    }
    opts.max_compact_array_complexity = args.max_compact_array_complexity;
    opts.max_prop_name_padding = args.max_prop_name_padding;
    opts.colon_before_prop_name_padding = args.colon_before_prop_name_padding;
    opts.always_expand_depth = args.always_expand_depth;
    opts.colon_padding = !args.no_colon_padding;
    opts.comma_padding = !args.no_comma_padding;
    opts.comment_padding = !args.no_comment_padding;
    opts.table_object_minimum_similarity = args.table_object_minimum_similarity;
    opts.table_array_minimum_similarity = args.table_array_minimum_similarity;
    opts.east_asian_width = args.east_asian_width;

    opts.table_comma_placement = match args.table_comma_placement {
        TableCommaPlacementArg::BeforePadding => TableCommaPlacement::BeforePadding,
        TableCommaPlacementArg::AfterPadding => TableCommaPlacement::AfterPadding,
        TableCommaPlacementArg::BeforeExceptNumbers => TableCommaPlacement::BeforePaddingExceptNumbers,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn defaults_match_option_defaults() {
        let args = Args::parse_from(["fjson"]);
        let mut opts = FracturedJsonOptions::default();
        configure_options(&mut opts, &args);
        let defaults = FracturedJsonOptions::default();
        assert_eq!(opts.max_total_line_length, defaults.max_total_line_length);
        assert_eq!(opts.table_object_minimum_similarity, defaults.table_object_minimum_similarity);
        assert_eq!(opts.table_array_minimum_similarity, defaults.table_array_minimum_similarity);
        assert!(!opts.east_asian_width);
    }

    #[test]
    fn trailing_commas_and_comment_policy_flags() {
        let args = Args::parse_from(["fjson", "--trailing-commas", "--comments", "preserve"]);
        let mut opts = FracturedJsonOptions::default();
        configure_options(&mut opts, &args);
        assert!(opts.allow_trailing_commas);
        assert_eq!(opts.comment_policy, CommentPolicy::Preserve);
    }

    #[test]
    fn negated_padding_flags_flip_defaults() {
        let args = Args::parse_from(["fjson", "--no-colon-padding", "--no-comma-padding"]);
        let mut opts = FracturedJsonOptions::default();
        configure_options(&mut opts, &args);
        assert!(!opts.colon_padding);
        assert!(!opts.comma_padding);
        assert!(opts.comment_padding);
    }

    #[test]
    fn table_comma_placement_flag() {
        let args = Args::parse_from(["fjson", "--table-comma-placement", "after-padding"]);
        let mut opts = FracturedJsonOptions::default();
        configure_options(&mut opts, &args);
        assert_eq!(opts.table_comma_placement, TableCommaPlacement::AfterPadding);
    }
}
