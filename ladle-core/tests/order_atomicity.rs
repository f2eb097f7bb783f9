//! Orders cross from the bus handler to the loop without tearing

use ladle_core::bus::{BusReceiver, OrderCell};
use ladle_protocol::Order;

fn order_for(k: i16) -> Order {
    let even = k % 2 == 0;
    Order::new(k, k, even, even)
}

#[test]
fn test_concurrent_reads_never_mix_fields() {
    let cell = OrderCell::new();

    std::thread::scope(|s| {
        s.spawn(|| {
            let mut rx = BusReceiver::new(&cell);
            for k in 0..20_000i16 {
                rx.on_message(&order_for(k).encode()).unwrap();
            }
        });

        for _ in 0..3 {
            s.spawn(|| {
                let mut last_generation = 0;
                for _ in 0..20_000 {
                    let snap = cell.snapshot();
                    assert!(snap.generation >= last_generation);
                    last_generation = snap.generation;
                    if snap.generation == 0 {
                        continue;
                    }
                    let order = snap.order;
                    assert_eq!(order.item.raw(), order.quantity);
                    assert_eq!(order.soap_clean, order.quantity % 2 == 0);
                    assert_eq!(order.rinse_clean, order.soap_clean);
                    // Generation n carries the (n-1)th message
                    assert_eq!(order.quantity as u32, snap.generation - 1);
                }
            });
        }
    });

    let last = cell.snapshot();
    assert_eq!(last.generation, 20_000);
    assert_eq!(last.order, order_for(19_999));
}
