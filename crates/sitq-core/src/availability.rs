use crate::{PageDriver, PageElement, Result};

/// Decide whether the watched element signals availability
///
/// A missing element is the normal steady state and yields `false`. When
/// `positive_text` is set, the element's trimmed, lower-cased text must
/// contain it; otherwise any non-empty text counts as available, whatever
/// it says. Driver faults other than absence are returned to the caller.
pub async fn is_available<D: PageDriver>(
    driver: &D,
    selector: &str,
    positive_text: Option<&str>,
) -> Result<bool> {
    let Some(element) = driver.find_element(selector).await? else {
        tracing::debug!("Availability element {} not found", selector);
        return Ok(false);
    };

    let text = element.text().await?;
    let text = text.trim().to_lowercase();
    tracing::debug!("Availability element text: {:?}", text);

    Ok(text_signals_availability(&text, positive_text))
}

fn text_signals_availability(text: &str, positive_text: Option<&str>) -> bool {
    match positive_text {
        Some(needle) => text.contains(needle),
        None => !text.is_empty(),
    }
}
