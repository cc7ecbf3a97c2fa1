// tests/rewrite_idempotence.rs

mod common;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use sitepipe::dag::Task;
use sitepipe::dag::graph::rewrite_task;
use sitepipe::exec::Transform;
use sitepipe::fs::RealFileSystem;
use sitepipe::transforms::RewriteTransform;
use sitepipe_test_utils::builders::ConfigurationBuilder;

use crate::common::{list_tree, write_file};

fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    list_tree(dir)
        .into_iter()
        .map(|rel| {
            let bytes = fs::read(dir.join(&rel)).unwrap();
            (rel, bytes)
        })
        .collect()
}

#[tokio::test]
async fn second_rewrite_is_byte_identical() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_file(
        root,
        "temp/index.html",
        "<html><head>\n\
         <!-- build:css assets/site.css -->\n\
         <link rel=\"stylesheet\" href=\"assets/style/a.css\">\n\
         <link rel=\"stylesheet\" href=\"/node_modules/lib/lib.css\">\n\
         <!-- endbuild -->\n\
         <!-- build:js assets/site.js -->\n\
         <script src=\"assets/scripts/app.js\"></script>\n\
         <!-- endbuild -->\n\
         </head></html>\n",
    );
    write_file(root, "temp/about.html", "<p>no blocks</p>\n");
    write_file(root, "temp/assets/style/a.css", "a { }");
    write_file(root, "node_modules/lib/lib.css", ".lib { }\n");
    write_file(root, "temp/assets/scripts/app.js", "run();\n");

    let cfg = ConfigurationBuilder::new().build_at(root);
    let Task::Primitive(primitive) = rewrite_task(&cfg) else {
        panic!("rewrite is a primitive");
    };
    let transform = RewriteTransform::new(Arc::new(RealFileSystem));

    transform.run(&primitive.request).await.unwrap();
    let once = snapshot(&root.join("dist"));
    transform.run(&primitive.request).await.unwrap();
    let twice = snapshot(&root.join("dist"));

    assert_eq!(once, twice);
    assert_eq!(
        once.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["about.html", "assets/site.css", "assets/site.js", "index.html"]
    );
    assert_eq!(once["assets/site.css"], b"a { }\n.lib { }\n".to_vec());
    assert_eq!(once["about.html"], b"<p>no blocks</p>\n".to_vec());
}

#[tokio::test]
async fn missing_reference_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_file(
        root,
        "temp/index.html",
        "<!-- build:js app.js --><script src=\"gone.js\"></script><script src=\"here.js\"></script><!-- endbuild -->",
    );
    write_file(root, "temp/here.js", "here();");

    let cfg = ConfigurationBuilder::new().build_at(root);
    let Task::Primitive(primitive) = rewrite_task(&cfg) else {
        panic!("rewrite is a primitive");
    };
    RewriteTransform::new(Arc::new(RealFileSystem))
        .run(&primitive.request)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(root.join("dist/app.js")).unwrap(), "here();\n");
    assert_eq!(
        fs::read_to_string(root.join("dist/index.html")).unwrap(),
        r#"<script src="app.js"></script>"#
    );
}
