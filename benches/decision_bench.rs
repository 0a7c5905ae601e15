use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gatewarden::Acl;

fn build_acl() -> Acl {
    let mut acl = Acl::new();
    acl.add_role("guest", &[]).unwrap();
    acl.add_role("staff", &["guest"]).unwrap();
    acl.add_role("editor", &["staff"]).unwrap();
    for i in 0..32 {
        let id = format!("contractor_{i}");
        acl.add_role(id, &["staff"]).unwrap();
    }

    acl.add_resource("site", None).unwrap();
    acl.add_resource("news", Some("site")).unwrap();
    acl.add_resource("latest", Some("news")).unwrap();
    for i in 0..64 {
        let id = format!("article_{i}");
        acl.add_resource(id, Some("latest")).unwrap();
    }

    acl.allow(Some(&["guest"]), Some(&["site"]), Some(&["view"])).unwrap();
    acl.allow(Some(&["staff"]), Some(&["news"]), Some(&["edit", "submit"])).unwrap();
    acl.allow(Some(&["editor"]), Some(&["latest"]), Some(&["publish"])).unwrap();
    acl.deny(None, Some(&["article_0"]), Some(&["publish"])).unwrap();
    acl
}

fn bench_decisions(c: &mut Criterion) {
    let acl = build_acl();

    c.bench_function("allow_via_inherited_grant", |b| {
        b.iter(|| {
            acl.is_allowed(
                black_box(Some("editor")),
                black_box(Some("article_17")),
                black_box(Some("view")),
            )
            .unwrap()
        })
    });

    c.bench_function("deny_via_default_rule", |b| {
        b.iter(|| {
            acl.is_allowed(
                black_box(Some("guest")),
                black_box(Some("article_17")),
                black_box(Some("publish")),
            )
            .unwrap()
        })
    });

    c.bench_function("all_privileges_query", |b| {
        b.iter(|| {
            acl.is_allowed(black_box(Some("editor")), black_box(Some("latest")), None)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_decisions);
criterion_main!(benches);
