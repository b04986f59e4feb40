use std::time::SystemTime;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relaymail::{
    message::MessageComposer,
    notify::NoopNotifier,
    transport::mock::{MockRelay, MockResolver},
    Config, Mailer, Message,
};

fn message(body: &str) -> Message {
    Message::builder()
        .from("user@localhost")
        .to("root@localhost")
        .reply_to("user@localhost")
        .subject("Hello")
        .body(body)
}

fn criterion_benchmark(c: &mut Criterion) {
    let composer = MessageComposer::new(&Config::default());
    let short = message("Hello World!");
    let long = message(&".line\r\n".repeat(1000));

    c.bench_function("compose short message", |b| {
        b.iter(|| composer.compose(black_box(&short), SystemTime::UNIX_EPOCH))
    });
    c.bench_function("compose dotted message", |b| {
        b.iter(|| composer.compose(black_box(&long), SystemTime::UNIX_EPOCH))
    });

    let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
    c.bench_function("send through mock relay", |b| {
        b.iter(|| {
            let relay = MockRelay::accepting();
            let mailer = Mailer::new(Config::default())
                .resolver(&resolver)
                .connector(&relay)
                .notifier(NoopNotifier);
            assert!(mailer.send("relay", black_box(&short)).is_ok());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
