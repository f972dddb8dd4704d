// tests/build_pipeline.rs

mod common;
use crate::common::{init_tracing, with_timeout, SiteFixture};

use sitepipe::dag::plans::{BUILD_PLAN, CLEAN_CSS_JS_PLAN};
use sitepipe::dag::PlanBook;
use sitepipe::engine::RuntimeOptions;
use sitepipe::run_pipeline;

fn one_shot() -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle: true,
        queue_length: 1,
    }
}

fn minimal_site() -> SiteFixture {
    let site = SiteFixture::new();
    site.write("template-data.json", r#"{"title": "Sitepipe"}"#);
    site.write("src/templates/_head.tera", "<title>{{ title }}</title>");
    site.write(
        "src/templates/index.tera",
        "<!DOCTYPE html>\n<html>\n<head>\n{% include \"_head.tera\" %}\n<link rel=\"stylesheet\" href=\"assets/css/main.css\">\n</head>\n<body>\n<h1>{{ title }}</h1>\n</body>\n</html>\n",
    );
    site.write("src/scss/_vars.scss", "$accent: #c33;\n");
    site.write(
        "src/scss/main.scss",
        "@import 'vars';\nh1 { color: $accent; user-select: none; }\n",
    );
    site.write(
        "src/js/main.js",
        "var items = [1, 2, 3];\nitems.forEach(function (item) { console.log(item * 2); });\n",
    );
    site
}

#[tokio::test]
async fn build_produces_one_page_one_stylesheet_one_script() {
    init_tracing();
    let site = minimal_site();

    let summary = with_timeout(run_pipeline(
        site.context(),
        PlanBook::standard(),
        BUILD_PLAN,
        one_shot(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.failed_steps(), 0);
    assert_eq!(
        site.files_under("public"),
        vec![
            "assets/css/main.css",
            "assets/css/map/main.css.map",
            "assets/js/main.js",
            "index.html",
        ]
    );

    let page = site.read("public/index.html");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>Sitepipe</title>"));

    let css = site.read("public/assets/css/main.css");
    assert!(css.contains("sourceMappingURL=map/main.css.map"));
    assert!(!css.contains("$accent"));
}

#[tokio::test]
async fn broken_stylesheet_fails_the_run_but_other_outputs_land() {
    init_tracing();
    let site = minimal_site();
    site.write("src/scss/broken.scss", "h1 { color: $undefined; }\n");

    let summary = with_timeout(run_pipeline(
        site.context(),
        PlanBook::standard(),
        BUILD_PLAN,
        one_shot(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.failed_steps(), 1);
    assert!(site.exists("public/assets/css/main.css"));
    assert!(!site.exists("public/assets/css/broken.css"));
    assert!(site.exists("public/index.html"));
    assert!(site.exists("public/assets/js/main.js"));
}

#[tokio::test]
async fn clean_css_js_leaves_pages_and_images() {
    init_tracing();
    let site = minimal_site();
    site.write("public/index.html", "<!DOCTYPE html>");
    site.write("public/assets/css/main.css", "h1{}");
    site.write("public/assets/js/main.js", "var a;");
    site.write("public/assets/images/logo.svg", "<svg/>");

    let summary = with_timeout(run_pipeline(
        site.context(),
        PlanBook::standard(),
        CLEAN_CSS_JS_PLAN,
        one_shot(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.failed_steps(), 0);
    assert_eq!(
        site.files_under("public"),
        vec!["assets/images/logo.svg", "index.html"]
    );
}
