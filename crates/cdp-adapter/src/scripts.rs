//! Page-side scripts evaluated by [`crate::ChromeDriver`].
//!
//! Every script resolves the element by XPath and returns either
//! `{ status: 'missing' }` or `{ status: 'ok', ... }`.

use crate::error::{AdapterError, AdapterErrorKind};

fn with_element(path: &str, body: &str) -> Result<String, AdapterError> {
    let path_literal = serde_json::to_string(path).map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal)
            .with_hint(format!("invalid locator encoding: {}", err))
    })?;

    Ok(format!(
        "(() => {{\n            const el = document.evaluate({path}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;\n            if (!el) {{ return {{ status: 'missing' }}; }}\n            {body}\n        }})()",
        path = path_literal,
        body = body,
    ))
}

pub(crate) fn probe(path: &str) -> Result<String, AdapterError> {
    with_element(
        path,
        "const style = window.getComputedStyle(el);\n            const rect = el.getBoundingClientRect();\n            const visible = style.visibility !== 'hidden' && style.display !== 'none' && (rect.width > 0 || rect.height > 0 || el.getClientRects().length > 0);\n            const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';\n            return { status: 'ok', visible, enabled };",
    )
}

/// Scrolls the target into view and reports whether its centre point hits it.
pub(crate) fn hit_test(path: &str) -> Result<String, AdapterError> {
    with_element(
        path,
        "el.scrollIntoView({ block: 'center', inline: 'center' });\n            const rect = el.getBoundingClientRect();\n            const top = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);\n            const hit = !!top && (top === el || el.contains(top));\n            const blocker = hit || !top ? null : (top.tagName + (top.id ? '#' + top.id : ''));\n            return { status: 'ok', hit, blocker };",
    )
}

pub(crate) fn scripted_click(path: &str) -> Result<String, AdapterError> {
    with_element(path, "el.click();\n            return { status: 'ok' };")
}

pub(crate) fn reveal(path: &str) -> Result<String, AdapterError> {
    with_element(
        path,
        "el.style.display = 'block';\n            el.style.visibility = 'visible';\n            el.removeAttribute('hidden');\n            el.removeAttribute('disabled');\n            return { status: 'ok' };",
    )
}

pub(crate) fn clear_value(path: &str) -> Result<String, AdapterError> {
    with_element(
        path,
        "el.value = '';\n            el.dispatchEvent(new Event('input', { bubbles: true }));\n            return { status: 'ok' };",
    )
}

pub(crate) fn submit_form(path: &str) -> Result<String, AdapterError> {
    with_element(
        path,
        "const form = el.form || el.closest('form');\n            if (!form) { return { status: 'no-form' }; }\n            if (typeof form.requestSubmit === 'function') { form.requestSubmit(); } else { form.submit(); }\n            return { status: 'ok' };",
    )
}
