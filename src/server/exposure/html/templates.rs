//! Built-in Tera templates of the admin screens

use crate::core::error::AdminError;
use serde::Serialize;
use tera::{Context, Tera};

const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{% block page_title %}{{ title }}{% endblock page_title %}</title>
  <style>
    body { font-family: sans-serif; margin: 2rem; }
    table { border-collapse: collapse; }
    td, th { border: 1px solid #ccc; padding: 0.25rem 0.5rem; }
    .message { color: #a00; }
    .flash { color: #060; }
    .marker { color: #888; font-size: 0.8em; }
    form.inline { display: inline; }
  </style>
</head>
<body>
  <header>
    <strong>{{ title }}</strong>
    {% if logout_action %}
    <form class="inline" method="post" action="{{ logout_action }}">
      {% if username %}<span>{{ username }}</span>{% endif %}
      <button type="submit">Logout</button>
    </form>
    {% endif %}
  </header>
  <main>{% block content %}{% endblock content %}</main>
</body>
</html>
"#;

const LOGIN: &str = r#"{% extends "base.html" %}
{% block content %}
<h1>Login</h1>
{% if error_message %}<p class="message">{{ error_message }}</p>{% endif %}
<form method="post" action="{{ action }}">
  <input type="hidden" name="next" value="{{ next }}">
  <label>Username <input type="text" name="username" value="{{ username }}" autofocus></label>
  <label>Password <input type="password" name="password"></label>
  <button type="submit">Login</button>
</form>
{% endblock content %}
"#;

const INDEX: &str = r#"{% extends "base.html" %}
{% block content %}
<h1>Models</h1>
<ul>
{% for model in models %}
  <li><a href="{{ model.href }}">{{ model.name }}</a></li>
{% endfor %}
</ul>
{% endblock content %}
"#;

const LIST: &str = r#"{% extends "base.html" %}
{% block page_title %}{{ model }} - {{ title }}{% endblock page_title %}
{% block content %}
<h1><a href="{{ index_href }}">Models</a> / {{ model }}</h1>
{% if flash %}<p class="flash">{{ flash }}</p>{% endif %}
<form method="post" action="{{ action }}">
  <input type="text" name="value" value="{{ filter }}" placeholder="filter">
  <button type="submit" name="action" value="filter">Filter</button>
</form>
<form method="post" action="{{ action }}">
  <button type="submit" name="action" value="clear-filter">Clear</button>
  <button type="submit" name="action" value="new">New</button>
  <button type="submit" name="action" value="refresh">Refresh</button>
</form>
<form method="post" action="{{ action }}">
  {% if has_prev %}<button type="submit" name="action" value="prev">Prev</button>{% endif %}
  <span>offset {{ offset }}</span>
  {% if has_next %}<button type="submit" name="action" value="next">Next</button>{% endif %}
</form>
<table>
  <thead>
    <tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr>
  </thead>
  <tbody>
  {% for row in rows %}
    <tr>
    {% for cell in row.cells %}
      {% if loop.first %}<td><a href="{{ row.href }}">{{ cell }}</a></td>{% else %}<td>{{ cell }}</td>{% endif %}
    {% endfor %}
    </tr>
  {% endfor %}
  </tbody>
</table>
<form method="post" action="{{ action }}">
  {% if has_prev %}<button type="submit" name="action" value="prev">Prev</button>{% endif %}
  <span>offset {{ offset }}</span>
  {% if has_next %}<button type="submit" name="action" value="next">Next</button>{% endif %}
</form>
<form method="post" action="{{ action }}">
  <input type="hidden" name="action" value="page-size">
  <label>Page size <input type="number" min="1" name="value" value="{{ page_size }}"></label>
  <button type="submit">Set</button>
</form>
{% endblock content %}
"#;

const EDIT: &str = r#"{% extends "base.html" %}
{% block page_title %}{{ model }} - {{ title }}{% endblock page_title %}
{% block content %}
<h1><a href="{{ index_href }}">Models</a> / <a href="{{ list_href }}">{{ model }}</a> / {{ record }}</h1>
{% if db_message %}<p class="message">{{ db_message }}</p>{% endif %}
{% if form_message %}<p class="message">{{ form_message }}</p>{% endif %}
<table>
{% for field in fields %}
  <tr>
    <th>{{ field.label }}</th>
    <td>
    {% set c = field.control %}
    {% if c.control == "read_only" %}
      {{ c.display }}
    {% elif c.control == "checkbox" %}
      <form class="inline" method="post" action="{{ field.action }}">
        <input type="hidden" name="value" value="{{ c.toggle_to }}">
        <input type="checkbox" {% if c.checked %}checked{% endif %} onchange="this.form.submit()">
      </form>
    {% elif c.control == "select" %}
      <form class="inline" method="post" action="{{ field.action }}">
        <select name="value" onchange="this.form.submit()">
          {% if c.nullable %}<option value="" {% if field.is_null %}selected{% endif %}></option>{% endif %}
          {% for option in c.options %}
          <option value="{{ option.value }}" {% if option.selected %}selected{% endif %}>{{ option.label }}</option>
          {% endfor %}
        </select>
      </form>
    {% elif c.control == "unsupported" %}
      <em>Unsupported field ({{ c.type_name }})</em>
    {% else %}
      <form class="inline" method="post" action="{{ field.action }}">
        <input type="{% if c.control == 'number' %}number{% else %}text{% endif %}" name="value" value="{{ c.value }}"
          {% if c.control == "date_time" %}placeholder="now or YYYY-MM-DDTHH:MM:SSZ"{% endif %}
          {% if c.randomize %}placeholder="random"{% endif %}>
        <button type="submit">Set</button>
      </form>
    {% endif %}
    {% if field.is_null %}<span class="marker">(NULL)</span>{% endif %}
    {% if field.is_default %}<span class="marker">(default)</span>{% endif %}
    {% if field.resettable %}
      <form class="inline" method="post" action="{{ field.reset_action }}">
        <button type="submit">Reset</button>
      </form>
    {% endif %}
    </td>
  </tr>
{% endfor %}
</table>
<form class="inline" method="post" action="{{ save_action }}"><button type="submit">Save</button></form>
<form class="inline" method="post" action="{{ discard_action }}"><button type="submit">Discard</button></form>
{% if not is_new %}
<form class="inline" method="post" action="{{ delete_action }}"><button type="submit">Delete</button></form>
{% endif %}
{% endblock content %}
"#;

/// Compiled template set
///
/// Autoescaping is on for every template (all names end in `.html`), which
/// also entity-encodes `/` inside URLs.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, AdminError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", BASE),
            ("login.html", LOGIN),
            ("index.html", INDEX),
            ("list.html", LIST),
            ("edit.html", EDIT),
        ])?;
        Ok(Self { tera })
    }

    /// Add or replace a template, e.g. a custom `login.html`
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), AdminError> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    pub fn render(&self, name: &str, data: &impl Serialize) -> Result<String, AdminError> {
        let context = Context::from_serialize(data)?;
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_templates_compile() {
        let templates = Templates::new().expect("templates should compile");
        let html = templates
            .render(
                "index.html",
                &json!({
                    "title": "Admin",
                    "logout_action": "/auth/logout",
                    "username": "root",
                    "models": [{"name": "Hero", "href": "/crud/Hero"}],
                }),
            )
            .expect("render should succeed");
        assert!(html.contains(">Hero</a>"));
        assert!(html.contains("Logout"));
    }

    #[test]
    fn test_values_are_escaped() {
        let templates = Templates::new().expect("templates should compile");
        let html = templates
            .render(
                "login.html",
                &json!({
                    "title": "Admin",
                    "action": "/auth/login",
                    "next": "/crud",
                    "username": "<script>",
                    "error_message": "",
                }),
            )
            .expect("render should succeed");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_add_template_overrides_login() {
        let mut templates = Templates::new().expect("templates should compile");
        templates
            .add_template("login.html", "<p>custom {{ title }}</p>")
            .expect("template should compile");
        let html = templates
            .render("login.html", &json!({"title": "Back office"}))
            .expect("render should succeed");
        assert_eq!(html, "<p>custom Back office</p>");
    }
}
