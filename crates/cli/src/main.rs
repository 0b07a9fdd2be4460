use clap::Parser;
use viewerq_cli::cli::Cli;
use viewerq_cli::error::CliError;
use viewerq_cli::output::{self, OutputFormat, ResultBuilder};
use viewerq_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(err, command, format);
		std::process::exit(1);
	}
}

fn handle_error(err: CliError, command: &'static str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	output::print_error_stderr(&cmd_error);

	if format == OutputFormat::Json {
		let builder = ResultBuilder::<()>::new(command);
		let result = match cmd_error.details.clone() {
			Some(details) => builder.error_with_details(cmd_error.code, &cmd_error.message, details),
			None => builder.error(cmd_error.code, &cmd_error.message),
		}
		.build();
		output::print_result(&result, format);
	}
}
