mod common;

use std::fs;

use common::HOST;
use rhyton::templates::sanitize_template_name;
use rhyton::{
    Application, Config, Handler, JinjaTemplates, Params, RequestContext, TemplateEngine,
    TemplateError,
};
use serde_json::json;

fn page(ctx: &mut RequestContext<'_>, params: &Params) -> anyhow::Result<String> {
    let title = ctx
        .config()
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("untitled");
    Ok(ctx.render_template(
        "page.gmi",
        &json!({ "title": title, "name": params.get("name") }),
    )?)
}

#[test]
fn test_render_through_application() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("page.gmi"), "# {{ title }}\nHello {{ name }}").unwrap();

    let config = Config::new(HOST)
        .unwrap()
        .searchpath([dir.path()])
        .option("title", "Capsule");
    let mut app = Application::new(config).with_default_templates();
    app.route("/page/<name>", Handler::new(page)).unwrap();

    let r = app.bind().unwrap().respond(HOST, "/page/ann", Vec::new()).unwrap();
    assert_eq!(r.body(), b"# Capsule\nHello ann");
}

#[test]
fn test_nested_template_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("partials")).unwrap();
    fs::write(dir.path().join("partials").join("footer.gmi"), "=> / home").unwrap();
    fs::write(
        dir.path().join("index.gmi"),
        "# Index\n{% include \"partials/footer.gmi\" %}",
    )
    .unwrap();

    let engine = JinjaTemplates::new([dir.path()], false);
    assert_eq!(
        engine.render_template("index.gmi", &json!({})).unwrap(),
        "# Index\n=> / home"
    );
}

#[test]
fn test_parent_segments_are_not_found() {
    let root = tempfile::tempdir().unwrap();
    let templates = root.path().join("templates");
    fs::create_dir(&templates).unwrap();
    fs::write(root.path().join("secret.gmi"), "secret").unwrap();

    let engine = JinjaTemplates::new([&templates], false);
    for name in ["../secret.gmi", "a/../../secret.gmi", "..\\secret.gmi"] {
        assert!(
            matches!(
                engine.render_template(name, &json!({})),
                Err(TemplateError::NotFound { .. })
            ),
            "{name}"
        );
        assert!(sanitize_template_name(name).is_none());
    }
}

#[test]
fn test_autoescape_from_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("t.gmi"), "{{ v }}").unwrap();

    let config = Config::new(HOST)
        .unwrap()
        .searchpath([dir.path()])
        .autoescape(true);
    let engine = JinjaTemplates::from_config(&config);
    assert_eq!(
        engine.render_template("t.gmi", &json!({ "v": "<a>" })).unwrap(),
        "&lt;a&gt;"
    );
}

#[test]
fn test_default_searchpath() {
    let config = Config::new(HOST).unwrap();
    let engine = JinjaTemplates::from_config(&config);
    assert_eq!(engine.searchpath(), &[std::path::PathBuf::from("templates")]);
}
