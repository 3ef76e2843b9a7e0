//! DOM side of the viewer: debug line, status icon, info card, selector

use tracing::warn;
use verdant_core::{InfoPanel, Notice, PlantCatalog, StatusIndicator, ViewerUi};
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlOptionElement, HtmlSelectElement};

pub const SELECTOR_ID: &str = "plantSelector";
pub const INFO_ID: &str = "plantInfo";
pub const DEBUG_ID: &str = "debug-message";
pub const STATUS_ID: &str = "status-icon";
pub const CANVAS_ID: &str = "xr-canvas";

/// Look up an element by id and cast it, `None` if absent or of another type
pub fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<T>().ok())
}

/// `ViewerUi` backed by the page's elements
///
/// Every element is optional; a page without one of them simply loses that
/// part of the feedback.
pub struct DomUi {
    document: Document,
    debug: Option<HtmlElement>,
    status: Option<HtmlElement>,
    info: Option<HtmlElement>,
}

impl DomUi {
    pub fn new(document: &Document) -> Self {
        let ui = Self {
            document: document.clone(),
            debug: element_by_id(document, DEBUG_ID),
            status: element_by_id(document, STATUS_ID),
            info: element_by_id(document, INFO_ID),
        };
        for (id, found) in [
            (DEBUG_ID, ui.debug.is_some()),
            (STATUS_ID, ui.status.is_some()),
            (INFO_ID, ui.info.is_some()),
        ] {
            if !found {
                warn!(id, "Page element missing");
            }
        }
        ui
    }

    fn render_info(&self, info: &HtmlElement, name: &str, description: &str) -> Result<(), JsValue> {
        info.replace_children_with_node_0();
        let heading = self.document.create_element("h2")?;
        heading.set_text_content(Some(name));
        info.append_child(&heading)?;
        let paragraph = self.document.create_element("p")?;
        paragraph.set_text_content(Some(description));
        info.append_child(&paragraph)?;
        info.style().set_property("display", "block")
    }
}

impl ViewerUi for DomUi {
    fn show_notice(&mut self, notice: &Notice) {
        if let Some(debug) = &self.debug {
            debug.set_text_content(Some(&notice.to_string()));
        }
    }

    fn set_indicator(&mut self, indicator: StatusIndicator) {
        let Some(status) = &self.status else {
            return;
        };
        status.set_text_content(Some(indicator.glyph()));
        let classes = status.class_list();
        for class in StatusIndicator::ALL_CLASSES {
            if class != indicator.css_class() {
                let _ = classes.remove_1(class);
            }
        }
        if let Err(err) = classes.add_1(indicator.css_class()) {
            warn!(error = ?err, "Failed to update status icon class");
        }
    }

    fn show_info(&mut self, panel: &InfoPanel) {
        let Some(info) = &self.info else {
            return;
        };
        let result = match panel {
            InfoPanel::Visible { name, description } => self.render_info(info, name, description),
            InfoPanel::Hidden => info.style().set_property("display", "none"),
        };
        if let Err(err) = result {
            warn!(error = ?err, "Failed to update plant info card");
        }
    }
}

/// Fill an empty selector from the catalog; a page that ships its own options is left alone
pub fn populate_selector(select: &HtmlSelectElement, catalog: &PlantCatalog) -> Result<(), JsValue> {
    if select.length() > 0 {
        return Ok(());
    }
    let placeholder = HtmlOptionElement::new_with_text_and_value("Choose a plant", "")?;
    select.add_with_html_option_element(&placeholder)?;
    for entry in catalog.entries() {
        let option = HtmlOptionElement::new_with_text_and_value(&entry.name, &entry.key)?;
        select.add_with_html_option_element(&option)?;
    }
    Ok(())
}
