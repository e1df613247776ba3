// Example: an unvirtualized feed paging through a fallible iterator.
use infiniscroll::SentinelProbe;
use infiniscroll_adapter::{FeedOptions, PagedSource, UnvirtualizedFeed};

fn main() {
    let rows = (0..12).map(|i| if i == 7 { Err("row 7 is corrupt") } else { Ok(i) });
    let options = FeedOptions::default()
        .with_on_load_state(Some(|state: &infiniscroll::LoadState| println!("state={state:?}")));
    let mut feed = UnvirtualizedFeed::attach(PagedSource::new(rows, 5), options);

    for _ in 0..8 {
        feed.poll();
        // Pretend every row is 20 units tall inside a 100-unit container.
        let top = feed.source().items().len() as f64 * 20.0;
        if !feed.on_scroll(20.0, SentinelProbe::new(top - 20.0, 100.0)) && feed.retry() {
            println!("retrying");
        }
        feed.poll();
    }
    println!("items={:?}", feed.source().items());
}
