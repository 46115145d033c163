//! In-process stand-in for a real MPI job, used by tests and the demo
//! binary so neither needs a cluster toolchain.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

use crate::error::TransportError;
use crate::framing::{decode_frame, encode_frame};
use crate::Transport;

type MailKey = (i32, i32, i32); // (dest, source, tag)

struct AllGatherState {
    generation: u64,
    slots: Vec<Option<i32>>,
    last_result: Vec<i32>,
}

/// Shared switchboard backing every [`FakeTransport`] handle spawned from
/// the same [`FakeNetwork::spawn`] call. Each handle sees the others as if
/// they were separate MPI ranks.
pub struct FakeNetwork {
    size: i32,
    mailboxes: Mutex<HashMap<MailKey, VecDeque<Vec<u8>>>>,
    mail_cv: Condvar,
    all_gather: Mutex<AllGatherState>,
    all_gather_cv: Condvar,
}

impl FakeNetwork {
    /// Build a network of `size` ranks and return one `FakeTransport` handle
    /// per rank, indexed by rank.
    #[must_use]
    pub fn spawn(size: i32) -> Vec<FakeTransport> {
        let network = Arc::new(FakeNetwork {
            size,
            mailboxes: Mutex::new(HashMap::new()),
            mail_cv: Condvar::new(),
            all_gather: Mutex::new(AllGatherState {
                generation: 0,
                slots: vec![None; size as usize],
                last_result: Vec::new(),
            }),
            all_gather_cv: Condvar::new(),
        });
        (0..size)
            .map(|rank| FakeTransport {
                network: Arc::clone(&network),
                rank,
            })
            .collect()
    }
}

/// One rank's view of a [`FakeNetwork`].
#[derive(Clone)]
pub struct FakeTransport {
    network: Arc<FakeNetwork>,
    rank: i32,
}

impl Transport for FakeTransport {
    fn rank(&self) -> i32 {
        self.rank
    }

    fn size(&self) -> i32 {
        self.network.size
    }

    fn processor_name(&self) -> String {
        format!("fake-node-{}", self.rank)
    }

    fn send(&self, dest: i32, tag: i32, payload: &[u8]) -> Result<(), TransportError> {
        let key = (dest, self.rank, tag);
        let mut mailboxes = self.network.mailboxes.lock().unwrap();
        mailboxes
            .entry(key)
            .or_insert_with(VecDeque::new)
            .push_back(encode_frame(payload));
        self.network.mail_cv.notify_all();
        Ok(())
    }

    fn recv(&self, source: i32, tag: i32) -> Result<Vec<u8>, TransportError> {
        let key = (self.rank, source, tag);
        let mut mailboxes = self.network.mailboxes.lock().unwrap();
        loop {
            if let Some(queue) = mailboxes.get_mut(&key) {
                if let Some(framed) = queue.pop_front() {
                    return decode_frame(&framed).map(<[u8]>::to_vec);
                }
            }
            mailboxes = self.network.mail_cv.wait(mailboxes).unwrap();
        }
    }

    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, TransportError> {
        let mut state = self.network.all_gather.lock().unwrap();
        let my_generation = state.generation;
        state.slots[self.rank as usize] = Some(value);

        if state.slots.iter().all(Option::is_some) {
            let result: Vec<i32> = state.slots.iter().map(|s| s.unwrap()).collect();
            for slot in &mut state.slots {
                *slot = None;
            }
            state.last_result = result.clone();
            state.generation += 1;
            self.network.all_gather_cv.notify_all();
            return Ok(result);
        }

        while state.generation == my_generation {
            state = self.network.all_gather_cv.wait(state).unwrap();
        }
        Ok(state.last_result.clone())
    }
}
