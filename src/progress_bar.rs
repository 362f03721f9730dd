use indicatif::{style::TemplateError, ProgressBar, ProgressStyle};

pub fn create_size_bar(enabled: bool) -> Result<ProgressBar, TemplateError> {
    if !enabled {
        return Ok(ProgressBar::hidden());
    }

    let progress_bar = ProgressBar::new(0);

    progress_bar.set_style(ProgressStyle::default_bar().template(
        "{percent:3}% [{bar:.cyan/blue}] {pos:.yellow}/{len:.magenta} {wide_msg}",
    )?);

    Ok(progress_bar)
}

pub fn create_index_spinner(enabled: bool) -> Result<ProgressBar, TemplateError> {
    if !enabled {
        return Ok(ProgressBar::hidden());
    }

    let spinner = ProgressBar::new_spinner();

    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    Ok(spinner)
}
