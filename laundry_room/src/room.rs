//! Machine room agent: answers machine requests from the shared pool

use crate::pool::SharedPool;
use crate::{Event, RoomStats, Stats};
use des::{Agent, Response};

pub struct MachineRoom {
    pool: SharedPool,
}

impl MachineRoom {
    pub fn new(pool: SharedPool) -> Self {
        MachineRoom { pool }
    }
}

impl Agent<Event, Stats> for MachineRoom {
    fn act(&mut self, current_t: usize, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::MachineRequested { student, duration } => {
                match self.pool.try_acquire(current_t, *duration) {
                    Some(grant) => {
                        log::debug!(
                            "[{}] student {} granted machine {} until {}",
                            current_t,
                            student,
                            grant.machine,
                            grant.until
                        );
                        Response::event(
                            current_t,
                            Event::MachineGranted {
                                student: *student,
                                machine: grant.machine,
                                until: grant.until,
                            },
                        )
                    }
                    None => {
                        log::debug!("[{}] student {} found no free machine", current_t, student);
                        Response::event(current_t, Event::MachineBusy { student: *student })
                    }
                }
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        let pool = self.pool.snapshot();
        Stats::Room(RoomStats {
            busy_until: pool.busy_until().to_vec(),
            grants: pool.grants(),
            denials: pool.denials(),
        })
    }
}
