use crate::core::spec::uri::encode_uri;
use anyhow::{Error, bail};
use tracing::trace;

/// Hidden 1x1 image html that fires the impression url
pub fn tracking_pixel_html(url: &str) -> Result<String, Error> {
    if url.trim().is_empty() {
        bail!("Empty impression url, cannot build tracking pixel");
    }

    Ok(format!(
        r#"<div style="position:absolute;left:0px;top:0px;visibility:hidden;"><img src="{}"></div>"#,
        encode_uri(url)
    ))
}

/// Appends the impression pixel to banner markup
pub fn inject_banner_beacon(beacon_url: Option<&str>, markup: &str) -> Result<String, Error> {
    let Some(beacon_url) = beacon_url else {
        bail!("Banner bid carries no impression tracker");
    };

    let pixel_html = tracking_pixel_html(beacon_url)?;
    let new_markup = markup.to_owned() + pixel_html.as_str();
    trace!("Adm post beacon: {}", &new_markup);

    Ok(new_markup)
}
