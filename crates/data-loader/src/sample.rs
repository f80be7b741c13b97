//! Built-in sample catalog used to seed an empty store.

use crate::types::{Course, DataIndex};
use std::collections::HashSet;
use tracing::{info, warn};

/// Below this many courses the store is topped up from the sample catalog
pub const SEED_THRESHOLD: usize = 50;

/// (title, description, category)
const SAMPLE_COURSES: &[(&str, &str, &str)] = &[
    ("Introduction to Machine Learning", "Learn the fundamentals of ML algorithms and applications", "Data Science"),
    ("Python for Data Analysis", "Pandas, NumPy, and data visualization techniques", "Data Science"),
    ("Deep Learning Fundamentals", "Neural networks and deep learning architectures", "Data Science"),
    ("SQL Database Design", "Database architecture and optimization strategies", "Data Science"),
    ("Data Visualization with Tableau", "Create compelling visualizations and dashboards", "Data Science"),
    ("Big Data Analytics", "Hadoop, Spark, and distributed computing", "Data Science"),
    ("Natural Language Processing", "Text analysis, sentiment analysis, and NLP models", "Data Science"),
    ("Computer Vision", "Image processing and recognition systems", "Data Science"),
    ("Time Series Analysis", "Forecasting and trend analysis techniques", "Data Science"),
    ("Statistical Modeling", "Advanced statistical methods and hypothesis testing", "Data Science"),
    ("Data Mining", "Pattern discovery and knowledge extraction from data", "Data Science"),
    ("Reinforcement Learning", "Q-learning, policy gradients, and RL applications", "Data Science"),
    ("Web Development Bootcamp", "Full-stack web development from scratch", "Programming"),
    ("React Advanced Patterns", "Advanced React techniques and best practices", "Programming"),
    ("JavaScript Mastery", "Advanced JavaScript concepts and ES6+ features", "Programming"),
    ("Node.js Backend Development", "Build scalable server-side applications", "Programming"),
    ("Python Programming Mastery", "Advanced Python concepts and design patterns", "Programming"),
    ("Java Enterprise Development", "Spring Boot, microservices, and enterprise patterns", "Programming"),
    ("C++ Advanced Programming", "Memory management, templates, and STL", "Programming"),
    ("Go Programming Language", "Concurrent programming and Go best practices", "Programming"),
    ("Rust Systems Programming", "Memory safety and high-performance systems", "Programming"),
    ("TypeScript Deep Dive", "Type safety and advanced TypeScript features", "Programming"),
    ("Vue.js Complete Guide", "Modern frontend framework development", "Programming"),
    ("Angular Framework Mastery", "Enterprise Angular applications", "Programming"),
    ("Django Web Framework", "Python web development with Django", "Programming"),
    ("Flask API Development", "RESTful APIs and microservices with Flask", "Programming"),
    ("GraphQL API Design", "Modern API architecture with GraphQL", "Programming"),
    ("Data Structures and Algorithms", "Master DSA concepts and problem-solving", "Computer Science"),
    ("System Design", "Design scalable distributed systems", "Computer Science"),
    ("Cloud Computing Basics", "AWS, Azure, and GCP fundamentals", "Computer Science"),
    ("Operating Systems", "Process management, memory, and file systems", "Computer Science"),
    ("Computer Networks", "TCP/IP, HTTP, and network protocols", "Computer Science"),
    ("Distributed Systems", "Consensus algorithms and distributed computing", "Computer Science"),
    ("Database Systems", "ACID properties, transactions, and indexing", "Computer Science"),
    ("Compiler Design", "Lexical analysis, parsing, and code generation", "Computer Science"),
    ("Cryptography", "Encryption, hashing, and security protocols", "Computer Science"),
    ("Software Architecture", "Design patterns and architectural principles", "Computer Science"),
    ("Concurrent Programming", "Threading, synchronization, and parallel computing", "Computer Science"),
    ("Algorithm Design", "Greedy algorithms, dynamic programming, and optimization", "Computer Science"),
    ("Ethical Hacking", "Penetration testing and security assessment", "Cybersecurity"),
    ("Network Security", "Firewalls, intrusion detection, and network defense", "Cybersecurity"),
    ("Web Application Security", "OWASP Top 10 and secure coding practices", "Cybersecurity"),
    ("Cryptography and Security", "Encryption, digital signatures, and PKI", "Cybersecurity"),
    ("iOS Development with Swift", "Build native iOS applications", "Mobile Development"),
    ("Android Development", "Kotlin and Java for Android apps", "Mobile Development"),
    ("React Native", "Cross-platform mobile app development", "Mobile Development"),
    ("Flutter Development", "Dart and Flutter for mobile apps", "Mobile Development"),
    ("Docker and Containerization", "Container orchestration and Docker best practices", "DevOps"),
    ("Kubernetes Mastery", "Container orchestration at scale", "DevOps"),
    ("CI/CD Pipelines", "Automated testing and deployment", "DevOps"),
    ("Git Version Control", "Advanced Git workflows and collaboration", "DevOps"),
    ("UI/UX Design Principles", "User-centered design and usability", "UI/UX Design"),
    ("Figma Design Mastery", "Prototyping and design systems", "UI/UX Design"),
];

impl DataIndex {
    /// Top up a small catalog with the sample courses.
    ///
    /// Does nothing once the catalog holds `SEED_THRESHOLD` courses. Otherwise
    /// every sample course whose title is not already present is added under
    /// the next free id. Returns the number of courses added.
    pub fn seed_sample_courses(&mut self) -> usize {
        if self.courses.len() >= SEED_THRESHOLD {
            return 0;
        }

        let existing: HashSet<String> = self.courses().map(|c| c.title.clone()).collect();
        let mut added = 0;
        for &(title, description, category) in SAMPLE_COURSES {
            if existing.contains(title) {
                continue;
            }
            let Some(id) = self.next_course_id() else {
                warn!("Course id space exhausted, stopping seed");
                break;
            };
            self.insert_course(Course {
                id,
                title: title.to_string(),
                description: description.to_string(),
                category: category.to_string(),
            });
            added += 1;
        }

        if added > 0 {
            info!("Seeded {} sample courses", added);
        }
        added
    }
}
