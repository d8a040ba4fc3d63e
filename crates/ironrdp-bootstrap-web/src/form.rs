use std::rc::Rc;

use ironrdp_bootstrap::{ConnectionRequest, FormFields};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlButtonElement, HtmlElement, HtmlInputElement};

use crate::client::{Control, RdpClient};

struct FormElements {
    button: HtmlButtonElement,
    host: HtmlInputElement,
    port: HtmlInputElement,
    username: HtmlInputElement,
    password: HtmlInputElement,
    status: HtmlElement,
}

impl FormElements {
    fn fields(&self) -> FormFields {
        FormFields {
            host: self.host.value(),
            port: self.port.value(),
            username: self.username.value(),
            password: self.password.value(),
        }
    }

    fn show_status(&self, status: &str) {
        self.status.set_text_content(Some(status));
    }
}

/// Wires a connect button and its inputs to a client.
///
/// The button is disabled right away and the click handler is only attached once the module is
/// loaded. If loading fails, the button stays disabled and the status element shows why.
#[wasm_bindgen(js_name = bindConnectForm)]
pub fn bind_connect_form(
    client: &RdpClient,
    button_id: &str,
    host_id: &str,
    port_id: &str,
    username_id: &str,
    password_id: &str,
    status_id: &str,
) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available"))?;

    let form = Rc::new(FormElements {
        button: element_by_id(&document, button_id)?,
        host: element_by_id(&document, host_id)?,
        port: element_by_id(&document, port_id)?,
        username: element_by_id(&document, username_id)?,
        password: element_by_id(&document, password_id)?,
        status: element_by_id(&document, status_id)?,
    });

    form.button.set_disabled(true);
    form.show_status("Loading...");

    spawn_local(attach(client.control(), form));

    Ok(())
}

async fn attach(control: Rc<Control>, form: Rc<FormElements>) {
    if let Err(error) = control.attach().await {
        form.show_status(&error.to_string());
        return;
    }

    let on_click = Closure::<dyn FnMut()>::new({
        let control = Rc::clone(&control);
        let form = Rc::clone(&form);

        move || {
            let request = ConnectionRequest::from_form(form.fields());
            spawn_local(submit(Rc::clone(&control), Rc::clone(&form), request));
        }
    });

    form.button.set_onclick(Some(on_click.as_ref().unchecked_ref()));

    // The handler lives as long as the page.
    on_click.forget();

    form.button.set_disabled(false);
    form.show_status("Ready");
}

async fn submit(control: Rc<Control>, form: Rc<FormElements>, request: ConnectionRequest) {
    form.button.set_disabled(true);
    form.show_status("Connecting...");

    match control.submit(request).await {
        Ok(()) => form.show_status("Connected"),
        Err(error) => form.show_status(&error.to_string()),
    }

    form.button.set_disabled(!control.is_enabled());
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("element `{id}` not found")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element `{id}` has an unexpected type")))
}
