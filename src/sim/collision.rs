//! Collision detection and response for the ball
//!
//! Walls reflect off fixed normals, the paddle uses the classic
//! offset-to-angle law and blocks use a separating-axis approximation.

use glam::Vec2;

use super::geometry::{Rect, circle_intersects_rect};

/// Which velocity component a block impact inverts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Result of a ball vs block check
#[derive(Debug, Clone, Copy)]
pub struct BlockImpact {
    /// Separating axis (the component that gets inverted)
    pub axis: Axis,
    /// Ball velocity after the bounce
    pub velocity: Vec2,
    /// Ball center pushed out of the block along `axis`
    pub position: Vec2,
}

/// Which field boundary the ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallContact {
    Left,
    Right,
    Ceiling,
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce a ball off the side walls and ceiling
///
/// Returns the corrected position/velocity and the walls touched. Only
/// surfaces the ball is moving into reflect it; the position is always
/// clamped back inside the field. The bottom edge is open.
pub fn ball_wall_collision(
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    field_width: f32,
) -> (Vec2, Vec2, Vec<WallContact>) {
    let mut pos = pos;
    let mut vel = vel;
    let mut contacts = Vec::new();

    if pos.x - radius <= 0.0 {
        pos.x = radius;
        if vel.x < 0.0 {
            vel = reflect_velocity(vel, Vec2::X);
        }
        contacts.push(WallContact::Left);
    } else if pos.x + radius >= field_width {
        pos.x = field_width - radius;
        if vel.x > 0.0 {
            vel = reflect_velocity(vel, Vec2::NEG_X);
        }
        contacts.push(WallContact::Right);
    }

    if pos.y - radius <= 0.0 {
        pos.y = radius;
        if vel.y < 0.0 {
            vel = reflect_velocity(vel, Vec2::Y);
        }
        contacts.push(WallContact::Ceiling);
    }

    (pos, vel, contacts)
}

/// Check whether the ball has fully left the field through the bottom
#[inline]
pub fn ball_below_field(pos: Vec2, radius: f32, field_height: f32) -> bool {
    pos.y - radius > field_height
}

/// Paddle reflection law
///
/// The normalized hit offset from the paddle center (clamped to [-1, 1])
/// maps linearly onto an angle from vertical, capped at `max_angle`.
/// Speed is preserved; only direction changes.
pub fn paddle_bounce(
    ball_x: f32,
    paddle_center_x: f32,
    paddle_width: f32,
    speed: f32,
    max_angle: f32,
) -> Vec2 {
    let half = paddle_width / 2.0;
    let hit_point = if half > 0.0 {
        ((ball_x - paddle_center_x) / half).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let angle = hit_point * max_angle;
    Vec2::new(angle.sin() * speed, -angle.cos() * speed)
}

/// Paddle contact test: the ball's bounding box against the paddle box
#[inline]
pub fn ball_touches_paddle(pos: Vec2, radius: f32, paddle: &Rect) -> bool {
    Rect::around_circle(pos, radius).intersects(paddle)
}

/// Separating axis for a ball overlapping a block
///
/// Compares center offsets relative to block size; the axis with the
/// larger relative offset is the one the ball came through.
pub fn separating_axis(ball_pos: Vec2, block: &Rect) -> Axis {
    let d = (ball_pos - block.center()).abs();
    if d.x / block.w > d.y / block.h {
        Axis::Horizontal
    } else {
        Axis::Vertical
    }
}

/// Check collision between a ball and a block
///
/// Uses closest-point distance for detection. The response inverts exactly
/// one velocity component, so speed is unchanged.
pub fn ball_block_collision(
    ball_pos: Vec2,
    ball_vel: Vec2,
    radius: f32,
    block: &Rect,
) -> Option<BlockImpact> {
    if !circle_intersects_rect(ball_pos, radius, block) {
        return None;
    }

    let axis = separating_axis(ball_pos, block);
    let center = block.center();
    let mut position = ball_pos;
    let velocity = match axis {
        Axis::Horizontal => {
            position.x = if ball_pos.x < center.x {
                block.x - radius
            } else {
                block.right() + radius
            };
            Vec2::new(-ball_vel.x, ball_vel.y)
        }
        Axis::Vertical => {
            position.y = if ball_pos.y < center.y {
                block.y - radius
            } else {
                block.bottom() + radius
            };
            Vec2::new(ball_vel.x, -ball_vel.y)
        }
    };

    Some(BlockImpact {
        axis,
        velocity,
        position,
    })
}

/// Clamp a velocity's magnitude into `[min_speed, max_speed]`, keeping direction
pub fn clamp_speed(vel: Vec2, min_speed: f32, max_speed: f32) -> Vec2 {
    let speed = vel.length();
    if speed == 0.0 {
        return vel;
    }
    if speed < min_speed {
        vel / speed * min_speed
    } else if speed > max_speed {
        vel / speed * max_speed
    } else {
        vel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_3;

    #[test]
    fn test_paddle_bounce_center_goes_straight_up() {
        let v = paddle_bounce(400.0, 400.0, 100.0, 300.0, FRAC_PI_3);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y + 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_paddle_bounce_left_edge_is_sixty_degrees() {
        let v = paddle_bounce(350.0, 400.0, 100.0, 300.0, FRAC_PI_3);
        let expected = Vec2::new(-300.0 * FRAC_PI_3.sin(), -300.0 * FRAC_PI_3.cos());
        assert!((v - expected).length() < 1e-3);
    }

    #[test]
    fn test_paddle_bounce_clamps_beyond_edge() {
        let edge = paddle_bounce(450.0, 400.0, 100.0, 300.0, FRAC_PI_3);
        let beyond = paddle_bounce(470.0, 400.0, 100.0, 300.0, FRAC_PI_3);
        assert!((edge - beyond).length() < 1e-4);
        assert!(edge.x > 0.0);
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_wall_collision_left_and_ceiling() {
        let (pos, vel, contacts) =
            ball_wall_collision(Vec2::new(3.0, 4.0), Vec2::new(-100.0, -50.0), 8.0, 800.0);
        assert_eq!(pos, Vec2::new(8.0, 8.0));
        assert_eq!(vel, Vec2::new(100.0, 50.0));
        assert_eq!(contacts, vec![WallContact::Left, WallContact::Ceiling]);
    }

    #[test]
    fn test_wall_collision_no_double_flip() {
        // Already moving away from the right wall: clamp only
        let (pos, vel, contacts) =
            ball_wall_collision(Vec2::new(797.0, 300.0), Vec2::new(-100.0, 10.0), 8.0, 800.0);
        assert_eq!(pos.x, 792.0);
        assert_eq!(vel, Vec2::new(-100.0, 10.0));
        assert_eq!(contacts, vec![WallContact::Right]);
    }

    #[test]
    fn test_ball_below_field() {
        assert!(!ball_below_field(Vec2::new(0.0, 605.0), 8.0, 600.0));
        assert!(ball_below_field(Vec2::new(0.0, 609.0), 8.0, 600.0));
    }

    #[test]
    fn test_block_collision_from_below_inverts_vertical() {
        let block = Rect::new(100.0, 50.0, 60.0, 20.0);
        let hit = ball_block_collision(Vec2::new(130.0, 76.0), Vec2::new(40.0, -300.0), 8.0, &block)
            .expect("ball overlaps block");
        assert_eq!(hit.axis, Axis::Vertical);
        assert_eq!(hit.velocity, Vec2::new(40.0, 300.0));
        assert_eq!(hit.position.y, 78.0);
    }

    #[test]
    fn test_block_collision_from_side_inverts_horizontal() {
        let block = Rect::new(100.0, 50.0, 60.0, 20.0);
        let hit = ball_block_collision(Vec2::new(94.0, 60.0), Vec2::new(200.0, 50.0), 8.0, &block)
            .expect("ball overlaps block");
        assert_eq!(hit.axis, Axis::Horizontal);
        assert_eq!(hit.velocity, Vec2::new(-200.0, 50.0));
        assert_eq!(hit.position.x, 92.0);
    }

    #[test]
    fn test_block_collision_miss() {
        let block = Rect::new(100.0, 50.0, 60.0, 20.0);
        assert!(ball_block_collision(Vec2::new(130.0, 90.0), Vec2::Y, 8.0, &block).is_none());
    }

    #[test]
    fn test_clamp_speed() {
        let v = clamp_speed(Vec2::new(0.0, -900.0), 300.0, 600.0);
        assert!((v.length() - 600.0).abs() < 1e-3);
        let v = clamp_speed(Vec2::new(30.0, 40.0), 300.0, 600.0);
        assert!((v.length() - 300.0).abs() < 1e-3);
        assert_eq!(clamp_speed(Vec2::ZERO, 300.0, 600.0), Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_paddle_bounce_preserves_speed(
            ball_x in 0.0f32..800.0,
            paddle_x in 50.0f32..750.0,
            width in 50.0f32..200.0,
            speed in 1.0f32..900.0,
        ) {
            let v = paddle_bounce(ball_x, paddle_x, width, speed, FRAC_PI_3);
            prop_assert!((v.length() - speed).abs() < speed * 1e-4);
            // Always rebounds upward, within 60 degrees of vertical
            prop_assert!(v.y < 0.0);
            prop_assert!(v.x.abs() <= speed * FRAC_PI_3.sin() + 1e-3);
        }

        #[test]
        fn prop_wall_collision_preserves_speed(
            x in -20.0f32..820.0,
            y in -20.0f32..300.0,
            vx in -500.0f32..500.0,
            vy in -500.0f32..500.0,
        ) {
            let vel = Vec2::new(vx, vy);
            let (_, out, _) = ball_wall_collision(Vec2::new(x, y), vel, 8.0, 800.0);
            prop_assert!((out.length() - vel.length()).abs() < 1e-3);
        }

        #[test]
        fn prop_block_collision_inverts_one_axis(
            bx in 60.0f32..200.0,
            by in 30.0f32..120.0,
            vx in -500.0f32..500.0,
            vy in -500.0f32..500.0,
        ) {
            let block = Rect::new(100.0, 50.0, 60.0, 20.0);
            let vel = Vec2::new(vx, vy);
            if let Some(hit) = ball_block_collision(Vec2::new(bx, by), vel, 8.0, &block) {
                prop_assert!((hit.velocity.length() - vel.length()).abs() < 1e-3);
                let flipped_x = hit.velocity.x == -vel.x && hit.velocity.y == vel.y;
                let flipped_y = hit.velocity.y == -vel.y && hit.velocity.x == vel.x;
                prop_assert!(flipped_x || flipped_y);
            }
        }
    }
}
