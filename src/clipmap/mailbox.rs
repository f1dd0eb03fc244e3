use std::mem;
use std::sync::Mutex;

use super::region::Region;

/// Double-buffered dirty-region queue.
///
/// Any number of cache workers append to the write list with [`Mailbox::post`];
/// the render thread takes the whole list at once with
/// [`Mailbox::switch_and_get`], leaving a fresh empty list behind. A post that
/// races a swap lands in exactly one of the two lists, and a posted region is
/// handed to exactly one drain.
#[derive(Default)]
pub struct Mailbox {
    write: Mutex<Vec<Region>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, region: Region) {
        self.write.lock().unwrap().push(region);
    }

    /// Exchanges the write list for an empty one, returning the regions
    /// accumulated since the previous call. Single-consumer.
    pub fn switch_and_get(&self) -> Vec<Region> {
        mem::take(&mut *self.write.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn posts_are_drained_in_order() {
        let mailbox = Mailbox::new();
        mailbox.post(Region::new(0, 1, 0, 1, 1));
        mailbox.post(Region::new(0, 2, 0, 1, 1));
        let drained = mailbox.switch_and_get();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].x, 1);
        assert_eq!(drained[1].x, 2);
        assert!(mailbox.switch_and_get().is_empty());
    }

    #[test]
    fn no_region_is_lost_or_duplicated_across_swaps() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: i32 = 200;

        let mailbox = Arc::new(Mailbox::new());
        let mut handles = Vec::new();
        for p in 0..PRODUCERS {
            let mailbox = Arc::clone(&mailbox);
            handles.push(thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    mailbox.post(Region::new(p, i, 0, 1, 1));
                }
            }));
        }

        // Drain concurrently with the producers.
        let mut seen = vec![vec![false; PER_PRODUCER as usize]; PRODUCERS];
        let mut total = 0;
        while total < PRODUCERS * PER_PRODUCER as usize {
            for region in mailbox.switch_and_get() {
                let slot = &mut seen[region.level][region.x as usize];
                assert!(!*slot, "region drained twice");
                *slot = true;
                total += 1;
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(mailbox.switch_and_get().is_empty());
    }
}
