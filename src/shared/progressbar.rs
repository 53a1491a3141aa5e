use indicatif::ProgressStyle;

static BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg} [Elapsed: {elapsed_precise}] | [ETA: {eta_precise}]";
static BAR_CHARS: &str = "=> ";

/// Progress style for per-file batch work, prefixed with the task name.
pub fn file_progress_style(task: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!("{} {}", task, BAR_TEMPLATE))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(BAR_CHARS)
}
