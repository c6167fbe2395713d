use crate::core::{Driver, ScriptArg};
use crate::errors::Result;

pub const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView(true);";
pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// HTML5 drag-and-drop from `arguments[0]` onto `arguments[1]`.
pub const DRAG_AND_DROP: &str = r#"
const source = arguments[0];
const target = arguments[1];
const data = new DataTransfer();
const fire = (el, type) => el.dispatchEvent(
    new DragEvent(type, { bubbles: true, cancelable: true, dataTransfer: data })
);
fire(source, 'dragstart');
fire(target, 'dragenter');
fire(target, 'dragover');
fire(target, 'drop');
fire(source, 'dragend');
return true;
"#;

/// Helpers for the scripts page operations inject.
pub struct JavaScriptRunner;

impl JavaScriptRunner {
    pub async fn scroll_into_view<D: Driver>(driver: &D, element: &D::Element) -> Result<()> {
        driver
            .execute_script(SCROLL_INTO_VIEW, vec![ScriptArg::Element(element.clone())])
            .await?;
        Ok(())
    }

    pub async fn scroll_to_top<D: Driver>(driver: &D) -> Result<()> {
        driver.execute_script(SCROLL_TO_TOP, vec![]).await?;
        Ok(())
    }

    pub async fn scroll_to_bottom<D: Driver>(driver: &D) -> Result<()> {
        driver.execute_script(SCROLL_TO_BOTTOM, vec![]).await?;
        Ok(())
    }
}
