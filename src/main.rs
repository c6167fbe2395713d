use anyhow::{bail, Context};
use clap::Parser;
use page_pilot::core::BrowserType;
use page_pilot::utils::ScreenshotManager;
use page_pilot::{browser, BasePage, Config, Driver, Locator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Open a page, wait for elements, interact with them and take a screenshot.
#[derive(Debug, Parser)]
#[command(name = "page-pilot", version)]
struct Cli {
    /// Page to open
    url: String,

    /// chrome, edge or firefox
    #[arg(long)]
    browser: Option<BrowserType>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds each wait may take
    #[arg(long)]
    timeout: Option<u64>,

    /// Wait until an element is visible, e.g. `css:#booking-form`
    #[arg(long, value_parser = Locator::parse)]
    wait: Vec<Locator>,

    /// Type into an element: `LOCATOR=TEXT`, split at the last `=`
    #[arg(long = "type", value_parser = parse_typing)]
    typing: Vec<(Locator, String)>,

    /// Click an element
    #[arg(long, value_parser = Locator::parse)]
    click: Vec<Locator>,

    /// Save a PNG screenshot; without a path a timestamped name is used,
    /// `-` prints the image as base64 instead
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    screenshot: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum ScreenshotTarget {
    File(PathBuf),
    Stdout,
}

impl ScreenshotTarget {
    fn from_arg(arg: &str) -> Self {
        match arg {
            "-" => ScreenshotTarget::Stdout,
            "" => ScreenshotTarget::File(PathBuf::from(ScreenshotManager::default_file_name())),
            path => ScreenshotTarget::File(PathBuf::from(path)),
        }
    }
}

/// Takes the screenshot and returns the line to print for it.
async fn screenshot<D: Driver>(
    page: &BasePage<D>,
    target: &ScreenshotTarget,
) -> anyhow::Result<String> {
    match target {
        ScreenshotTarget::File(path) => {
            let written = page.capture_screenshot(path).await?;
            Ok(written.display().to_string())
        }
        ScreenshotTarget::Stdout => {
            Ok(ScreenshotManager::take_base64(page.driver().as_ref()).await?)
        }
    }
}

fn parse_typing(input: &str) -> Result<(Locator, String), String> {
    let (locator, text) = input
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LOCATOR=TEXT, got {:?}", input))?;
    let locator = Locator::parse(locator).map_err(|e| e.to_string())?;
    Ok((locator, text.to_string()))
}

async fn run<D: Driver>(page: &BasePage<D>, cli: &Cli, url: &Url) -> anyhow::Result<()> {
    page.navigate_to_url(url.as_str()).await?;
    info!(title = %page.get_page_title().await?, "page opened");

    for locator in &cli.wait {
        page.wait_for_visible_element(locator, page.timeout())
            .await
            .with_context(|| format!("waiting for {}", locator))?;
    }

    for (locator, text) in &cli.typing {
        page.input_text(locator, text)
            .await
            .with_context(|| format!("typing into {}", locator))?;
    }

    for locator in &cli.click {
        page.click_element(locator)
            .await
            .with_context(|| format!("clicking {}", locator))?;
    }

    if let Some(arg) = &cli.screenshot {
        let line = screenshot(page, &ScreenshotTarget::from_arg(arg)).await?;
        println!("{}", line);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let url = Url::parse(&cli.url).with_context(|| format!("invalid URL {:?}", cli.url))?;
    if !matches!(url.scheme(), "http" | "https" | "file") {
        bail!("unsupported URL scheme {:?}", url.scheme());
    }

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    }
    .apply_env()?;
    if let Some(browser_type) = cli.browser {
        config.browser.browser_type = browser_type;
    }
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(secs) = cli.timeout {
        config.waits.default_timeout_secs = secs;
    }

    let driver = Arc::new(browser::launch(&config.browser).await?);
    let page = BasePage::from_config(driver, &config.waits);

    let outcome = run(&page, &cli, &url).await;
    page.quit_browser().await?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use page_pilot::testing::{FakeDriver, FAKE_PNG};

    #[test]
    fn screenshot_argument_picks_the_target() {
        assert_eq!(ScreenshotTarget::from_arg("-"), ScreenshotTarget::Stdout);
        assert_eq!(
            ScreenshotTarget::from_arg("shots/home.png"),
            ScreenshotTarget::File(PathBuf::from("shots/home.png"))
        );
        assert!(matches!(
            ScreenshotTarget::from_arg(""),
            ScreenshotTarget::File(path) if path.to_string_lossy().starts_with("screenshot-")
        ));
    }

    #[tokio::test]
    async fn dash_prints_the_capture_as_base64() {
        let page = BasePage::new(Arc::new(FakeDriver::new()));
        let cli = Cli::try_parse_from(["page-pilot", "https://rooms.test/", "--screenshot", "-"])
            .unwrap();

        let target = ScreenshotTarget::from_arg(cli.screenshot.as_deref().unwrap());

        let line = screenshot(&page, &target).await.unwrap();

        assert_eq!(STANDARD.decode(line).unwrap(), FAKE_PNG);
    }
}
