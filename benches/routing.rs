use criterion::{criterion_group, criterion_main, Criterion};
use rhyton::router::{RouteOptions, Router};
use rhyton::{Application, Config, Handler, Params, RequestContext};
use std::hint::black_box;

const ROUTES: &[(&str, &str)] = &[
    ("/", "root"),
    ("/zoo/animals", "get_animals"),
    ("/zoo/animals/<int:id>", "get_animal"),
    ("/zoo/animals/<int:id>/toys/<toy_id>", "animal_toy"),
    (
        "/zoo/<category>/animals/<int:id>/habitats/<habitat_id>/sections/<section_id>",
        "habitat_section",
    ),
    (
        "/inventory/<warehouse_id>/feeds/<feed_id>/items/<item_id>/batches/<batch_id>",
        "item_batch",
    ),
    ("/complex/<a>/<b>/<c>/<d>/<e>/<f>/<g>/<h>/<i>", "complex_many_params"),
    ("/static/<path:file>", "static_file"),
];

const PATHS: &[&str] = &[
    "/zoo/animals/123",
    "/zoo/animals/123/toys/456",
    "/zoo/cats/animals/123/habitats/88/sections/5",
    "/inventory/1/feeds/2/items/3/batches/4",
    "/complex/1/2/3/4/5/6/7/8/9",
    "/static/css/site/main.css",
];

fn router() -> Router {
    let mut router = Router::new();
    for (pattern, endpoint) in ROUTES {
        router
            .register(pattern, endpoint, RouteOptions::default())
            .expect("valid pattern");
    }
    router
}

fn bench_route_match(c: &mut Criterion) {
    let router = router();
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for path in PATHS {
                black_box(router.route("bench.example", black_box(path)));
            }
        })
    });
}

fn bench_build(c: &mut Criterion) {
    let router = router();
    c.bench_function("build_path", |b| {
        b.iter(|| {
            black_box(
                router
                    .build("animal_toy", black_box(&[("id", "123"), ("toy_id", "ball")]))
                    .ok(),
            )
        })
    });
}

fn ok(_ctx: &mut RequestContext<'_>, _params: &Params) -> anyhow::Result<&'static str> {
    Ok("ok")
}

fn bench_dispatch(c: &mut Criterion) {
    let mut app = Application::new(Config::new("bench.example").expect("host"));
    for (pattern, endpoint) in ROUTES {
        app.register(pattern, None, Some(*endpoint), RouteOptions::default())
            .expect("valid pattern");
        app.endpoint(endpoint, Handler::new(ok)).expect("no collision");
    }
    let dispatcher = app.bind().expect("all endpoints bound");
    c.bench_function("dispatch", |b| {
        b.iter(|| {
            for path in PATHS {
                black_box(dispatcher.respond("bench.example", path, Vec::new()).ok());
            }
        })
    });
}

criterion_group!(benches, bench_route_match, bench_build, bench_dispatch);
criterion_main!(benches);
