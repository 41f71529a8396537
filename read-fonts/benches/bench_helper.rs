use read_fonts::collections::U32Set;

use rand::Rng;

pub fn random_set(size: u32, max_value: u32) -> U32Set {
    let mut rng = rand::thread_rng();
    let mut set = U32Set::empty();
    for _ in 0..size {
        loop {
            let candidate: u32 = rng.gen::<u32>() % max_value;
            if set.insert(candidate) {
                break;
            }
        }
    }
    set
}
